// src/ingest/mod.rs
pub mod config;
pub mod fields;
pub mod filter;
pub mod http;
pub mod paginate;
pub mod providers;
pub mod render;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::ingest::config::{has_url, SourcesConfig};
use crate::ingest::filter::Keywords;
use crate::ingest::http::HttpFetch;
use crate::ingest::providers::headhunter::HeadHunter;
use crate::ingest::providers::hiring_cafe::HiringCafe;
use crate::ingest::providers::rapid_jobs::RapidJobs;
use crate::ingest::providers::remoteok::RemoteOk;
use crate::ingest::providers::rss::RssFeeds;
use crate::ingest::providers::working_nomads::WorkingNomads;
use crate::ingest::types::{FetchOutcome, Posting, SourceKind};
use crate::metrics as m;
use crate::watermark::Watermark;

/// One configured source. The runner iterates a `Vec<Adapter>`.
pub enum Adapter {
    Rss(RssFeeds),
    RemoteOk(RemoteOk),
    WorkingNomads(WorkingNomads),
    HeadHunter(HeadHunter),
    HiringCafe(HiringCafe),
    RapidJobs(RapidJobs),
}

impl Adapter {
    pub fn kind(&self) -> SourceKind {
        match self {
            Adapter::Rss(_) => SourceKind::Rss,
            Adapter::RemoteOk(_) => SourceKind::RemoteOk,
            Adapter::WorkingNomads(_) => SourceKind::WorkingNomads,
            Adapter::HeadHunter(_) => SourceKind::HeadHunter,
            Adapter::HiringCafe(_) => SourceKind::HiringCafe,
            Adapter::RapidJobs(_) => SourceKind::RapidJobs,
        }
    }

    /// Fetch postings newer than `watermark`. Never fails as a whole: errors
    /// travel in the outcome next to whatever was collected before them.
    pub async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        let t0 = Instant::now();
        let outcome = match self {
            Adapter::Rss(a) => a.fetch(watermark).await,
            Adapter::RemoteOk(a) => a.fetch(watermark).await,
            Adapter::WorkingNomads(a) => a.fetch(watermark).await,
            Adapter::HeadHunter(a) => a.fetch(watermark).await,
            Adapter::HiringCafe(a) => a.fetch(watermark).await,
            Adapter::RapidJobs(a) => a.fetch(watermark).await,
        };

        let source = self.kind().as_str();
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!(m::FETCH_MS, "source" => source).record(ms);
        counter!(m::FETCHED_TOTAL, "source" => source).increment(outcome.postings.len() as u64);
        for e in &outcome.errors {
            tracing::warn!(source, kind = e.kind(), error = %e, "source error");
            counter!(m::SOURCE_ERRORS_TOTAL, "source" => source, "kind" => e.kind()).increment(1);
        }
        outcome
    }

    /// Telegram HTML for one posting of this source.
    pub fn render(&self, posting: &Posting) -> String {
        match self {
            Adapter::Rss(a) => a.render(posting),
            Adapter::RemoteOk(a) => a.render(posting),
            Adapter::WorkingNomads(a) => a.render(posting),
            Adapter::HeadHunter(a) => a.render(posting),
            Adapter::HiringCafe(a) => a.render(posting),
            Adapter::RapidJobs(a) => a.render(posting),
        }
    }

    /// Build adapters for every source with an endpoint, in run order.
    ///
    /// Sources that filter client-side (RSS, Remote OK, Working Nomads)
    /// inherit `global_keywords` unless their table sets its own list. The
    /// search APIs query server-side and only filter when configured to.
    pub fn registry(
        sources: &SourcesConfig,
        global_keywords: &Keywords,
        http: Arc<dyn HttpFetch>,
    ) -> Vec<Adapter> {
        let mut out = Vec::new();

        if let Some(c) = sources.rss.as_ref().filter(|c| !c.feeds.is_empty()) {
            let mut a = RssFeeds::new(c, http.clone());
            if c.keywords.is_none() {
                a = a.with_keywords(global_keywords.clone());
            }
            out.push(Adapter::Rss(a));
        }
        if let Some(c) = sources.remoteok.as_ref().filter(|c| has_url(&c.url)) {
            let mut a = RemoteOk::new(c, http.clone());
            if c.keywords.is_none() {
                a = a.with_keywords(global_keywords.clone());
            }
            out.push(Adapter::RemoteOk(a));
        }
        if let Some(c) = sources.working_nomads.as_ref().filter(|c| has_url(&c.url)) {
            let mut a = WorkingNomads::new(c, http.clone());
            if c.keywords.is_none() {
                a = a.with_keywords(global_keywords.clone());
            }
            out.push(Adapter::WorkingNomads(a));
        }
        if let Some(c) = sources.headhunter.as_ref().filter(|c| has_url(&c.url)) {
            out.push(Adapter::HeadHunter(HeadHunter::new(c, http.clone())));
        }
        if let Some(c) = sources.hiring_cafe.as_ref().filter(|c| has_url(&c.url)) {
            out.push(Adapter::HiringCafe(HiringCafe::new(c, http.clone())));
        }
        if let Some(c) = sources.rapid_jobs.as_ref().filter(|c| has_url(&c.url)) {
            out.push(Adapter::RapidJobs(RapidJobs::new(c, http)));
        }

        tracing::info!(
            sources = ?out.iter().map(|a| a.kind().as_str()).collect::<Vec<_>>(),
            "adapters registered"
        );
        out
    }
}
