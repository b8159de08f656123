// src/ingest/providers/rapid_jobs.rs
//! Job search API behind RapidAPI (`x-rapidapi-key` / `x-rapidapi-host`).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::annotate;
use crate::error::RelayError;
use crate::ingest::fields::non_blank;
use crate::ingest::filter::Keywords;
use crate::ingest::http::{fetch_json, HttpFetch, HttpRequest};
use crate::ingest::paginate::select_fresh;
use crate::ingest::providers::{or_not_specified, publish_time};
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

const DEFAULT_PARAMS: &[(&str, &str)] = &[
    ("query", "frontend"),
    ("location", "any"),
    ("remoteOnly", "true"),
    ("employmentTypes", "fulltime;parttime;intern;contractor"),
    ("datePosted", "today"),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RapidJobsConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    /// Merged over the default query string.
    pub params: BTreeMap<String, String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Job {
    title: Option<String>,
    job_providers: Option<Vec<Provider>>,
    date_posted: Option<String>,
    description: Option<String>,
    company: Option<String>,
    salary_range: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Provider {
    url: Option<String>,
}

pub struct RapidJobs {
    url: String,
    credentials: Option<(String, String)>,
    params: BTreeMap<String, String>,
    keywords: Keywords,
    http: Arc<dyn HttpFetch>,
}

impl RapidJobs {
    pub fn new(cfg: &RapidJobsConfig, http: Arc<dyn HttpFetch>) -> Self {
        let mut params: BTreeMap<String, String> = DEFAULT_PARAMS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.extend(cfg.params.clone());

        let credentials = match (
            non_blank(cfg.api_key.as_deref()),
            non_blank(cfg.api_host.as_deref()),
        ) {
            (Some(key), Some(host)) => Some((key, host)),
            _ => None,
        };

        Self {
            url: cfg.url.clone(),
            credentials,
            params,
            keywords: cfg
                .keywords
                .as_deref()
                .map(Keywords::new)
                .unwrap_or_default(),
            http,
        }
    }

    pub async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        let mut req = HttpRequest::get(&self.url);
        for (k, v) in &self.params {
            req = req.query(k, v);
        }
        if let Some((key, host)) = &self.credentials {
            req = req.header("x-rapidapi-key", key).header("x-rapidapi-host", host);
        } else {
            tracing::debug!(source = "rapid_jobs", "no api credentials configured, sending unauthenticated request");
        }

        let body: Value = match fetch_json(self.http.as_ref(), &req).await {
            Ok(v) => v,
            Err(e) => return FetchOutcome::failed(Vec::new(), e),
        };
        let Some(jobs) = body.get("jobs").and_then(Value::as_array) else {
            return FetchOutcome::failed(
                Vec::new(),
                RelayError::decode(&self.url, "response has no `jobs` array"),
            );
        };

        let now = Utc::now();
        let postings = jobs
            .iter()
            .cloned()
            .filter_map(|raw| match serde_json::from_value::<Job>(raw) {
                Ok(job) => normalize(job, now),
                Err(e) => {
                    tracing::warn!(source = "rapid_jobs", error = %e, "skipping malformed job");
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
        MessageBuilder::headline("💼", &p.title)
            .location(&m.flag, Some(or_not_specified(m.location.as_deref())))
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line("🏢", "Company", or_not_specified(m.company.as_deref()))
            .line("📝", "Description", &text::description_preview(&m.description))
            .line("💵", "Salary", or_not_specified(m.salary.as_deref()))
            .apply_link(&p.link)
            .hashtags(&m.hashtags)
            .finish()
    }
}

fn normalize(job: Job, now: DateTime<Utc>) -> Option<Posting> {
    let published_at = publish_time(
        SourceKind::RapidJobs,
        job.title.as_deref(),
        job.date_posted.as_deref(),
        now,
    )?;

    let location = non_blank(job.location.as_deref())
        .filter(|l| !l.eq_ignore_ascii_case(crate::ingest::fields::NOT_SPECIFIED));
    let link = job
        .job_providers
        .as_ref()
        .and_then(|ps| ps.first())
        .and_then(|p| p.url.clone());
    let empty: [&str; 0] = [];

    let metadata = Metadata {
        company: non_blank(job.company.as_deref()),
        description: text::clean_description(job.description.as_deref().unwrap_or_default()),
        salary: non_blank(job.salary_range.as_deref()),
        flag: annotate::flag_for(location.as_deref()).to_string(),
        hashtags: annotate::hashtags_with_location(location.as_deref(), &empty),
        location,
        ..Default::default()
    };

    Some(Posting::new(
        SourceKind::RapidJobs,
        job.title,
        link,
        published_at,
        metadata,
    ))
}
