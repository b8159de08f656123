// src/ingest/providers/working_nomads.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::annotate;
use crate::ingest::fields::non_blank;
use crate::ingest::filter::Keywords;
use crate::ingest::http::{fetch_json, ClientProfile, HttpFetch, HttpRequest};
use crate::ingest::paginate::select_fresh;
use crate::ingest::providers::{or_not_specified, publish_time};
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkingNomadsConfig {
    pub url: String,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    /// Comma-separated, e.g. `"react, javascript, remote"`.
    tags: Option<String>,
    location: Option<String>,
    company_name: Option<String>,
}

/// Working Nomads exposes a JSON array but rejects non-browser clients.
pub struct WorkingNomads {
    url: String,
    keywords: Keywords,
    http: Arc<dyn HttpFetch>,
}

impl WorkingNomads {
    pub fn new(cfg: &WorkingNomadsConfig, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            url: cfg.url.clone(),
            keywords: cfg
                .keywords
                .as_deref()
                .map(Keywords::new)
                .unwrap_or_default(),
            http,
        }
    }

    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        let req = HttpRequest::get(&self.url)
            .header("Accept", "application/json")
            .profile(ClientProfile::Browser);
        let items: Vec<Value> = match fetch_json(self.http.as_ref(), &req).await {
            Ok(v) => v,
            Err(e) => return FetchOutcome::failed(Vec::new(), e),
        };

        let now = Utc::now();
        let postings = items
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Item>(raw) {
                Ok(item) => normalize(item, now),
                Err(e) => {
                    tracing::warn!(source = "working_nomads", error = %e, "skipping malformed item");
                    None
                }
            })
            .collect();

        FetchOutcome::ok(select_fresh(postings, watermark, |p| {
            self.keywords.matches(p)
        }))
    }

    pub fn render(&self, p: &Posting) -> String {
        let m = &p.metadata;
        MessageBuilder::headline("🌍", &p.title)
            .location(&m.flag, Some(or_not_specified(m.location.as_deref())))
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line("🏢", "Company", or_not_specified(m.company.as_deref()))
            .line("📝", "Description", &text::description_preview(&m.description))
            .apply_link(&p.link)
            .hashtags(&m.hashtags)
            .finish()
    }
}

fn normalize(item: Item, now: DateTime<Utc>) -> Option<Posting> {
    let published_at = publish_time(
        SourceKind::WorkingNomads,
        item.title.as_deref(),
        item.pub_date.as_deref(),
        now,
    )?;

    let tags: Vec<String> = item
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let location = non_blank(item.location.as_deref());

    let metadata = Metadata {
        company: non_blank(item.company_name.as_deref()),
        description: text::clean_description(item.description.as_deref().unwrap_or_default()),
        flag: annotate::flag_for(location.as_deref()).to_string(),
        hashtags: annotate::hashtags_with_location(location.as_deref(), &tags),
        location,
        tags,
        ..Default::default()
    };

    Some(Posting::new(
        SourceKind::WorkingNomads,
        item.title,
        item.url,
        published_at,
        metadata,
    ))
}
