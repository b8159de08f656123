// src/ingest/providers/remoteok.rs
//! Remote OK public JSON feed: one array of postings, the first element of
//! which is a legal notice rather than a job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::annotate;
use crate::ingest::fields::{amount, format_salary, non_blank};
use crate::ingest::filter::Keywords;
use crate::ingest::http::{fetch_json, HttpFetch, HttpRequest};
use crate::ingest::paginate::select_fresh;
use crate::ingest::providers::{or_not_specified, publish_time};
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

const SALARY_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteOkConfig {
    pub url: String,
    /// Overrides the global keyword list when set.
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Item {
    legal: Option<String>,
    position: Option<String>,
    apply_url: Option<String>,
    url: Option<String>,
    description: Option<String>,
    date: Option<String>,
    #[serde(default)]
    tags: Vec<Value>,
    company: Option<String>,
    #[serde(default)]
    salary_min: Value,
    #[serde(default)]
    salary_max: Value,
    location: Option<String>,
}

pub struct RemoteOk {
    url: String,
    keywords: Keywords,
    http: Arc<dyn HttpFetch>,
}

impl RemoteOk {
    pub fn new(cfg: &RemoteOkConfig, http: Arc<dyn HttpFetch>) -> Self {
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
        let req = HttpRequest::get(&self.url).header("Accept", "application/json");
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
                    tracing::warn!(source = "remoteok", error = %e, "skipping malformed item");
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
        MessageBuilder::headline("📡", &p.title)
            .location(&m.flag, m.location.as_deref())
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line("🏢", "Company", or_not_specified(m.company.as_deref()))
            .line("📝", "Description", &text::description_preview(&m.description))
            .line("💵", "Estimated salary", or_not_specified(m.salary.as_deref()))
            .apply_link(&p.link)
            .hashtags(&m.hashtags)
            .finish()
    }
}

fn normalize(item: Item, now: DateTime<Utc>) -> Option<Posting> {
    if item.legal.is_some() && item.position.is_none() {
        return None;
    }
    let published_at = publish_time(
        SourceKind::RemoteOk,
        item.position.as_deref(),
        item.date.as_deref(),
        now,
    )?;

    let tags: Vec<String> = item
        .tags
        .iter()
        .filter_map(Value::as_str)
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let location = non_blank(item.location.as_deref());
    let salary = match (amount(&item.salary_min), amount(&item.salary_max)) {
        (None, None) => None,
        (lo, hi) => Some(format_salary(lo, hi, Some(SALARY_CURRENCY))),
    };

    let metadata = Metadata {
        company: non_blank(item.company.as_deref()),
        description: text::clean_description(item.description.as_deref().unwrap_or_default()),
        salary,
        flag: annotate::flag_for(location.as_deref()).to_string(),
        hashtags: annotate::derive_hashtags(&tags),
        location,
        tags,
        ..Default::default()
    };

    Some(Posting::new(
        SourceKind::RemoteOk,
        item.position,
        item.apply_url.or(item.url),
        published_at,
        metadata,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legal_notice_is_skipped() {
        let item: Item = serde_json::from_value(json!({
            "legal": "API Terms of Service: ..."
        }))
        .unwrap();
        assert!(normalize(item, Utc::now()).is_none());
    }

    #[test]
    fn apply_url_preferred_over_listing_url() {
        let item: Item = serde_json::from_value(json!({
            "position": "Frontend Engineer",
            "apply_url": "https://remoteok.test/apply/1",
            "url": "https://remoteok.test/1",
            "date": "2024-01-02T10:00:00+00:00",
            "tags": ["React", null, "typescript"],
            "salary_min": 0,
            "salary_max": 120000
        }))
        .unwrap();
        let p = normalize(item, Utc::now()).unwrap();
        assert_eq!(p.link, "https://remoteok.test/apply/1");
        assert_eq!(p.metadata.tags, vec!["react", "typescript"]);
        assert_eq!(p.metadata.salary.as_deref(), Some("to 120000 USD"));
    }

    #[test]
    fn undated_item_is_dropped() {
        let item: Item = serde_json::from_value(json!({ "position": "Dev" })).unwrap();
        assert!(normalize(item, Utc::now()).is_none());
    }
}
