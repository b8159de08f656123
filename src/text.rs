// src/text.rs
//! Text normalization for free-text posting fields and escaping for the
//! channel's HTML markup subset.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

/// Display length of descriptions inside a message.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Strip markup from an HTML fragment and return plain text.
///
/// Entities are decoded first so that escaped markup (common in RSS
/// descriptions) is removed as well. Tags become spaces, whitespace is
/// collapsed.
pub fn clean_description(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(html).to_string();

    // 2) Drop script/style bodies, then the remaining tags
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS
        .get_or_init(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
    out = re_blocks.replace_all(&out, " ").to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize typographic quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Cut `s` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Clean and shorten a description for display.
pub fn description_preview(raw: &str) -> String {
    truncate(&clean_description(raw), DESCRIPTION_PREVIEW_CHARS)
}

/// Escape user text for Telegram HTML (`&`, `<`, `>`).
pub fn escape(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}

/// Escape a value placed inside a double-quoted attribute (`href="..."`).
pub fn escape_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).to_string()
}

/// Human date used in messages, e.g. `02 January 2024`.
pub fn display_date(ts: &DateTime<Utc>) -> String {
    ts.format("%d %B %Y").to_string()
}
