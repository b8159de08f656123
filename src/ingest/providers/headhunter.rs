// src/ingest/providers/headhunter.rs
//! hh.ru vacancy search. Server-side filtering by text and schedule; results
//! are walked page by page until the API reports the last page.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::annotate;
use crate::error::Result;
use crate::ingest::fields::{amount, format_salary, non_blank};
use crate::ingest::filter::Keywords;
use crate::ingest::http::{fetch_json, HttpFetch, HttpRequest};
use crate::ingest::paginate::{collect_pages, Page, Pagination};
use crate::ingest::providers::{or_not_specified, publish_time};
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadHunterConfig {
    pub url: String,
    pub text: String,
    pub search_field: String,
    pub schedule: String,
    pub per_page: u32,
    pub max_pages: u32,
    /// Search window when no watermark exists yet.
    pub lookback_hours: i64,
    pub keywords: Option<Vec<String>>,
}

impl Default for HeadHunterConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            text: "frontend".into(),
            search_field: "name".into(),
            schedule: "remote".into(),
            per_page: 100,
            max_pages: 20,
            lookback_hours: 24,
            keywords: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<Value>,
    pages: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Vacancy {
    name: Option<String>,
    alternate_url: Option<String>,
    published_at: Option<String>,
    snippet: Option<Snippet>,
    employer: Option<Named>,
    experience: Option<Named>,
    area: Option<Named>,
    salary: Option<Salary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Snippet {
    responsibility: Option<String>,
    requirement: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Salary {
    from: Value,
    to: Value,
    currency: Option<String>,
}

pub struct HeadHunter {
    cfg: HeadHunterConfig,
    keywords: Keywords,
    http: Arc<dyn HttpFetch>,
}

impl HeadHunter {
    pub fn new(cfg: &HeadHunterConfig, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            keywords: cfg
                .keywords
                .as_deref()
                .map(Keywords::new)
                .unwrap_or_default(),
            cfg: cfg.clone(),
            http,
        }
    }

    pub async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        let now = Utc::now();
        let date_from = watermark
            .last_published_at()
            .unwrap_or_else(|| now - Duration::hours(self.cfg.lookback_hours));
        let date_from = date_from.format("%Y-%m-%dT%H:%M:%S%z").to_string();

        collect_pages(
            SourceKind::HeadHunter,
            Pagination::Exhaustive,
            self.cfg.max_pages,
            watermark,
            |p| self.keywords.matches(p),
            |page| self.fetch_page(page, date_from.clone(), now),
        )
        .await
    }

    async fn fetch_page(&self, page: u32, date_from: String, now: DateTime<Utc>) -> Result<Page> {
        let req = HttpRequest::get(&self.cfg.url)
            .query("text", &self.cfg.text)
            .query("search_field", &self.cfg.search_field)
            .query("schedule", &self.cfg.schedule)
            .query("date_from", date_from)
            .query("per_page", self.cfg.per_page.to_string())
            .query("page", page.to_string());
        tracing::info!(source = "headhunter", page, "requesting page");

        let body: SearchPage = fetch_json(self.http.as_ref(), &req).await?;
        let raw_count = body.items.len();
        let postings = body
            .items
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Vacancy>(raw) {
                Ok(v) => normalize(v, now),
                Err(e) => {
                    tracing::warn!(source = "headhunter", page, error = %e, "skipping malformed vacancy");
                    None
                }
            })
            .collect();

        Ok(Page {
            postings,
            raw_count,
            last_page: body.pages.map(|n| page + 1 >= n).unwrap_or(false),
        })
    }

    pub fn render(&self, p: &Posting) -> String {
        let m = &p.metadata;
        MessageBuilder::headline("💼", &p.title)
            .location(&m.flag, m.location.as_deref())
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line("⌛️", "Experience", or_not_specified(m.experience.as_deref()))
            .line("🏢", "Company", or_not_specified(m.company.as_deref()))
            .line("📝", "Description", &text::description_preview(&m.description))
            .line("💵", "Salary", or_not_specified(m.salary.as_deref()))
            .apply_link(&p.link)
            .hashtags(&m.hashtags)
            .finish()
    }
}

fn normalize(v: Vacancy, now: DateTime<Utc>) -> Option<Posting> {
    let published_at = publish_time(
        SourceKind::HeadHunter,
        v.name.as_deref(),
        v.published_at.as_deref(),
        now,
    )?;

    let raw_description = v
        .snippet
        .as_ref()
        .and_then(|s| {
            non_blank(s.responsibility.as_deref()).or_else(|| non_blank(s.requirement.as_deref()))
        })
        .unwrap_or_default();
    let salary = v.salary.as_ref().map(|s| {
        format_salary(amount(&s.from), amount(&s.to), s.currency.as_deref())
    });
    let location = v.area.and_then(|a| non_blank(a.name.as_deref()));
    let empty: [&str; 0] = [];

    let metadata = Metadata {
        company: v.employer.and_then(|e| non_blank(e.name.as_deref())),
        description: text::clean_description(&raw_description),
        salary,
        experience: v.experience.and_then(|e| non_blank(e.name.as_deref())),
        flag: annotate::flag_for(location.as_deref()).to_string(),
        hashtags: annotate::hashtags_with_location(location.as_deref(), &empty),
        location,
        ..Default::default()
    };

    Some(Posting::new(
        SourceKind::HeadHunter,
        v.name,
        v.alternate_url,
        published_at,
        metadata,
    ))
}
