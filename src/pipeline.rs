// src/pipeline.rs
//! One run: for each source in order, load its watermark, fetch, advance
//! and persist the watermark, then hand the accepted postings to the
//! dispatcher. A source never takes its siblings down with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tracing::Instrument;

use crate::ingest::types::{Posting, SourceKind};
use crate::ingest::Adapter;
use crate::metrics as m;
use crate::notify::Dispatcher;
use crate::watermark::{Watermark, WatermarkStore};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: SourceKind,
    /// Postings the adapter returned.
    pub fetched: usize,
    pub dispatched: usize,
    pub failed_sends: usize,
    /// Fetch errors (rendered), empty when the fetch was clean.
    pub errors: Vec<String>,
    pub watermark_before: Option<DateTime<Utc>>,
    pub watermark_after: Option<DateTime<Utc>>,
    pub watermark_saved: bool,
}

impl SourceReport {
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub promo_sent: bool,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Posting messages delivered across all sources (promo excluded).
    pub fn dispatched(&self) -> usize {
        self.sources.iter().map(|s| s.dispatched).sum()
    }

    pub fn failed_sources(&self) -> Vec<SourceKind> {
        self.sources
            .iter()
            .filter(|s| s.failed())
            .map(|s| s.source)
            .collect()
    }

    pub fn source(&self, kind: SourceKind) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == kind)
    }
}

pub struct Runner {
    adapters: Vec<Adapter>,
    store: Arc<dyn WatermarkStore>,
    dispatcher: Dispatcher,
    promo: Vec<String>,
    runs: u64,
}

impl Runner {
    pub fn new(adapters: Vec<Adapter>, store: Arc<dyn WatermarkStore>, dispatcher: Dispatcher) -> Self {
        Self {
            adapters,
            store,
            dispatcher,
            promo: Vec::new(),
            runs: 0,
        }
    }

    /// Messages rotated at the start of each run, one per run.
    pub fn with_promo(mut self, promo: Vec<String>) -> Self {
        self.promo = promo.into_iter().filter(|p| !p.trim().is_empty()).collect();
        self
    }

    pub fn sources(&self) -> Vec<SourceKind> {
        self.adapters.iter().map(Adapter::kind).collect()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub async fn run_once(&mut self) -> RunReport {
        let run = self.runs;
        self.runs += 1;
        let started_at = Utc::now();
        tracing::info!(run, sources = self.adapters.len(), "run started");

        let promo_sent = self.send_promo(run).await;

        let mut sources = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let kind = adapter.kind();
            let report = run_source(adapter, self.store.as_ref(), &mut self.dispatcher)
                .instrument(tracing::info_span!("source", source = %kind))
                .await;
            sources.push(report);
        }

        let finished_at = Utc::now();
        gauge!(m::LAST_RUN_TS).set(finished_at.timestamp() as f64);
        let report = RunReport {
            run,
            started_at,
            finished_at,
            promo_sent,
            sources,
        };
        tracing::info!(
            run,
            dispatched = report.dispatched(),
            failed_sources = ?report.failed_sources(),
            "run finished"
        );
        report
    }

    async fn send_promo(&mut self, run: u64) -> bool {
        if self.promo.is_empty() {
            return false;
        }
        let idx = (run % self.promo.len() as u64) as usize;
        self.dispatcher.send("promo", &self.promo[idx]).await.is_ok()
    }
}

async fn run_source(
    adapter: &Adapter,
    store: &dyn WatermarkStore,
    dispatcher: &mut Dispatcher,
) -> SourceReport {
    let kind = adapter.kind();
    let id = kind.as_str();

    let before = store.load(id).await;
    tracing::debug!(watermark = ?before.last_published_at(), "fetching");
    let outcome = adapter.fetch(&before).await;
    let fetched = outcome.postings.len();

    let accepted: Vec<Posting> = outcome
        .postings
        .into_iter()
        .filter(|p| before.is_newer(&p.published_at))
        .collect();
    if accepted.len() < fetched {
        tracing::warn!(dropped = fetched - accepted.len(), "adapter returned postings at or below the watermark");
    }
    counter!(m::ACCEPTED_TOTAL, "source" => id).increment(accepted.len() as u64);

    let mut after: Watermark = before;
    for p in &accepted {
        after.advance(p.published_at);
    }

    let mut watermark_saved = false;
    if after != before {
        if let Some(ts) = after.last_published_at() {
            match store.save(id, ts).await {
                Ok(()) => watermark_saved = true,
                Err(e) => tracing::warn!(error = %e, "watermark not saved, postings may repeat next run"),
            }
        }
    }

    let mut dispatched = 0;
    let mut failed_sends = 0;
    for p in &accepted {
        let text = adapter.render(p);
        match dispatcher.send(id, &text).await {
            Ok(_) => dispatched += 1,
            Err(_) => failed_sends += 1,
        }
    }

    tracing::info!(
        fetched,
        accepted = accepted.len(),
        dispatched,
        failed_sends,
        errors = outcome.errors.len(),
        "source done"
    );

    SourceReport {
        source: kind,
        fetched,
        dispatched,
        failed_sends,
        errors: outcome.errors.iter().map(ToString::to_string).collect(),
        watermark_before: before.last_published_at(),
        watermark_after: after.last_published_at(),
        watermark_saved,
    }
}
