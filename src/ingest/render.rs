// src/ingest/render.rs
//! Telegram HTML message assembly. Every user-supplied value goes through
//! [`text::escape`]; only the markup this builder emits is left raw.

use crate::text;

#[derive(Debug, Default)]
pub struct MessageBuilder {
    blocks: Vec<String>,
}

impl MessageBuilder {
    /// `"{icon} <b>{title}</b>"`
    pub fn headline(icon: &str, title: &str) -> Self {
        Self {
            blocks: vec![format!("{icon} <b>{}</b>", text::escape(title))],
        }
    }

    pub fn line(mut self, icon: &str, label: &str, value: &str) -> Self {
        self.blocks
            .push(format!("{icon} {label}: {}", text::escape(value)));
        self
    }

    pub fn optional_line(self, icon: &str, label: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.line(icon, label, v),
            None => self,
        }
    }

    /// `📍 Location: {flag} {location}`; skipped when the location is unknown.
    pub fn location(mut self, flag: &str, location: Option<&str>) -> Self {
        if let Some(loc) = location.map(str::trim).filter(|l| !l.is_empty()) {
            let loc = text::escape(loc);
            let line = if flag.is_empty() {
                format!("📍 Location: {loc}")
            } else {
                format!("📍 Location: {flag} {loc}")
            };
            self.blocks.push(line);
        }
        self
    }

    /// Apply anchor. Non-http links (the `#` placeholder) render nothing.
    pub fn apply_link(mut self, link: &str) -> Self {
        if link.starts_with("http://") || link.starts_with("https://") {
            self.blocks.push(format!(
                "👉 <a href=\"{}\">APPLY NOW</a>",
                text::escape_attr(link)
            ));
        }
        self
    }

    pub fn hashtags(mut self, tags: &[String]) -> Self {
        let joined = tags
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| text::escape(t))
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            self.blocks.push(joined);
        }
        self
    }

    pub fn finish(self) -> String {
        self.blocks.join("\n\n")
    }
}
