// src/ingest/types.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RelayError;

pub const UNTITLED: &str = "Untitled";
pub const NO_LINK: &str = "#";

/// Which adapter produced a posting. The id doubles as the watermark key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    RemoteOk,
    WorkingNomads,
    Rss,
    HeadHunter,
    HiringCafe,
    RapidJobs,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Rss,
        SourceKind::RemoteOk,
        SourceKind::WorkingNomads,
        SourceKind::HeadHunter,
        SourceKind::HiringCafe,
        SourceKind::RapidJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::RemoteOk => "remoteok",
            SourceKind::WorkingNomads => "working_nomads",
            SourceKind::Rss => "rss",
            SourceKind::HeadHunter => "headhunter",
            SourceKind::HiringCafe => "hiring_cafe",
            SourceKind::RapidJobs => "rapid_jobs",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source display fields. Everything is optional; renderers skip or
/// substitute "Not specified".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub company: Option<String>,
    /// Markup-free description (full length; renderers shorten it).
    pub description: String,
    pub salary: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub workplace: Option<String>,
    pub languages: Vec<String>,
    /// Raw lowercase tags, searched by the keyword filter.
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
    /// Decorative flag for `location`; empty when unknown.
    pub flag: String,
}

/// One normalized job listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source: SourceKind,
    pub metadata: Metadata,
}

impl Posting {
    /// Missing or blank title/link fall back to placeholders.
    pub fn new(
        source: SourceKind,
        title: Option<String>,
        link: Option<String>,
        published_at: DateTime<Utc>,
        metadata: Metadata,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let link = link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| NO_LINK.to_string());
        Self {
            title,
            link,
            published_at,
            source,
            metadata,
        }
    }

    /// Lowercase title, description and tags, joined for keyword search.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.metadata.description,
            self.metadata.tags.join(" ")
        )
        .to_lowercase()
    }

    pub fn has_link(&self) -> bool {
        self.link.starts_with("http://") || self.link.starts_with("https://")
    }
}

/// Result of one adapter fetch: what was accepted plus what went wrong.
/// Errors never discard postings collected before them.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub postings: Vec<Posting>,
    pub errors: Vec<RelayError>,
}

impl FetchOutcome {
    pub fn ok(postings: Vec<Posting>) -> Self {
        Self {
            postings,
            errors: Vec::new(),
        }
    }

    pub fn failed(postings: Vec<Posting>, error: RelayError) -> Self {
        Self {
            postings,
            errors: vec![error],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
