// src/ingest/providers/mod.rs
pub mod headhunter;
pub mod hiring_cafe;
pub mod rapid_jobs;
pub mod remoteok;
pub mod rss;
pub mod working_nomads;

use chrono::{DateTime, Utc};

use crate::dates::parse_timestamp_at;
use crate::ingest::types::SourceKind;

pub(crate) const NOT_SPECIFIED: &str = crate::ingest::fields::NOT_SPECIFIED;

/// Parse an item's publish time; items without one are dropped by the caller.
pub(crate) fn publish_time(
    source: SourceKind,
    title: Option<&str>,
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let title = title.unwrap_or_default();
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            tracing::warn!(source = %source, title, "posting has no publish date, dropped");
            None
        }
        Some(s) => {
            let parsed = parse_timestamp_at(s, now);
            if parsed.is_none() {
                tracing::warn!(source = %source, title, raw = s, "unparseable publish date, dropped");
            }
            parsed
        }
    }
}

pub(crate) fn or_not_specified(v: Option<&str>) -> &str {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}
