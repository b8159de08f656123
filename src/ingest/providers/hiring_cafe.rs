// src/ingest/providers/hiring_cafe.rs
//! Hiring Cafe search API. Results are sorted by date, so the page loop
//! stops at the first page with nothing newer than the watermark. Only
//! remote positions are kept.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{RelayError, Result};
use crate::ingest::fields::{amount, format_salary, non_blank, NOT_SPECIFIED};
use crate::ingest::filter::{is_remote, Keywords};
use crate::ingest::http::{fetch_json, HttpFetch, HttpRequest};
use crate::ingest::paginate::{collect_pages, Page, Pagination};
use crate::ingest::providers::{or_not_specified, publish_time};
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HiringCafeConfig {
    pub url: String,
    pub query: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub keywords: Option<Vec<String>>,
}

impl Default for HiringCafeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            query: "frontend".into(),
            page_size: 20,
            max_pages: 10,
            keywords: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hit {
    apply_url: Option<String>,
    v5_processed_job_data: Option<JobData>,
}

#[derive(Debug, Default, Deserialize)]
struct JobData {
    core_job_title: Option<String>,
    workplace_type: Option<String>,
    estimated_publish_date: Option<String>,
    requirements_summary: Option<String>,
    company_name: Option<String>,
    listed_compensation_frequency: Option<String>,
    listed_compensation_currency: Option<String>,
    seniority_level: Option<String>,
    language_requirements: Option<Vec<String>>,
    /// `yearly_min_compensation`, `hourly_max_compensation`, ...
    #[serde(flatten)]
    compensation: HashMap<String, Value>,
}

impl JobData {
    fn salary(&self) -> Option<String> {
        let freq = non_blank(self.listed_compensation_frequency.as_deref())?;
        let key = freq.to_lowercase();
        let lo = self
            .compensation
            .get(&format!("{key}_min_compensation"))
            .and_then(amount);
        let hi = self
            .compensation
            .get(&format!("{key}_max_compensation"))
            .and_then(amount);
        let base = format_salary(lo, hi, self.listed_compensation_currency.as_deref());
        if base == NOT_SPECIFIED {
            None
        } else {
            Some(format!("{base} {key}"))
        }
    }
}

pub struct HiringCafe {
    cfg: HiringCafeConfig,
    keywords: Keywords,
    http: Arc<dyn HttpFetch>,
}

impl HiringCafe {
    pub fn new(cfg: &HiringCafeConfig, http: Arc<dyn HttpFetch>) -> Self {
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
        collect_pages(
            SourceKind::HiringCafe,
            Pagination::EarlyExit,
            self.cfg.max_pages,
            watermark,
            |p| is_remote(p) && self.keywords.matches(p),
            |page| self.fetch_page(page, now),
        )
        .await
    }

    async fn fetch_page(&self, page: u32, now: DateTime<Utc>) -> Result<Page> {
        let body = json!({
            "size": self.cfg.page_size,
            "page": page,
            "searchState": {
                "searchQuery": self.cfg.query,
                "sortBy": "date"
            }
        });
        let req = HttpRequest::post_json(&self.cfg.url, body);
        tracing::info!(source = "hiring_cafe", page, "requesting page");

        let resp: SearchResponse = fetch_json(self.http.as_ref(), &req).await?;
        let results = resp
            .results
            .ok_or_else(|| RelayError::decode(&self.cfg.url, "response has no `results`"))?;
        let raw_count = results.len();
        let postings = results
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Hit>(raw) {
                Ok(hit) => normalize(hit, now),
                Err(e) => {
                    tracing::warn!(source = "hiring_cafe", page, error = %e, "skipping malformed result");
                    None
                }
            })
            .collect();

        Ok(Page {
            postings,
            raw_count,
            last_page: false,
        })
    }

    pub fn render(&self, p: &Posting) -> String {
        let m = &p.metadata;
        let languages = if m.languages.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            m.languages.join(", ")
        };
        MessageBuilder::headline("💼", &p.title)
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line("⌛️", "Experience", or_not_specified(m.experience.as_deref()))
            .line("🏢", "Company", or_not_specified(m.company.as_deref()))
            .line("📝", "Description", &text::description_preview(&m.description))
            .line("🔤", "Language", &languages)
            .line("💵", "Salary", or_not_specified(m.salary.as_deref()))
            .apply_link(&p.link)
            .finish()
    }
}

fn normalize(hit: Hit, now: DateTime<Utc>) -> Option<Posting> {
    let job = hit.v5_processed_job_data.unwrap_or_default();
    let published_at = publish_time(
        SourceKind::HiringCafe,
        job.core_job_title.as_deref(),
        job.estimated_publish_date.as_deref(),
        now,
    )?;

    let metadata = Metadata {
        company: non_blank(job.company_name.as_deref()),
        description: text::clean_description(job.requirements_summary.as_deref().unwrap_or_default()),
        salary: job.salary(),
        experience: non_blank(job.seniority_level.as_deref()),
        workplace: non_blank(job.workplace_type.as_deref()),
        languages: job
            .language_requirements
            .iter()
            .flatten()
            .filter_map(|l| non_blank(Some(l.as_str())))
            .collect(),
        ..Default::default()
    };

    Some(Posting::new(
        SourceKind::HiringCafe,
        job.core_job_title,
        hit.apply_url,
        published_at,
        metadata,
    ))
}
