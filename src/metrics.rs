// src/metrics.rs
use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

pub const FETCHED_TOTAL: &str = "relay_fetched_total";
pub const ACCEPTED_TOTAL: &str = "relay_accepted_total";
pub const SOURCE_ERRORS_TOTAL: &str = "relay_source_errors_total";
pub const DISPATCHED_TOTAL: &str = "relay_dispatched_total";
pub const DISPATCH_ERRORS_TOTAL: &str = "relay_dispatch_errors_total";
pub const FETCH_MS: &str = "relay_fetch_ms";
pub const LAST_RUN_TS: &str = "relay_last_run_ts";

/// One-time registration so series show up on /metrics before the first run.
pub fn describe_all() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(FETCHED_TOTAL, "Postings returned by adapters.");
        describe_counter!(ACCEPTED_TOTAL, "Postings kept by the runner for dispatch.");
        describe_counter!(SOURCE_ERRORS_TOTAL, "Adapter fetch/decode/auth errors.");
        describe_counter!(DISPATCHED_TOTAL, "Messages accepted by the channel.");
        describe_counter!(DISPATCH_ERRORS_TOTAL, "Messages the channel rejected.");
        describe_histogram!(FETCH_MS, "Adapter fetch time in milliseconds.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when the relay last completed a run.");
    });
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
pub fn install_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("installing prometheus exporter on {addr}"))?;
    describe_all();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
