//! jobfeed-relay binary entrypoint.
//! Loads config, wires adapters, watermark store and channel, then runs
//! once or on the wall-clock schedule until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobfeed_relay::config::RelayConfig;
use jobfeed_relay::ingest::filter::Keywords;
use jobfeed_relay::ingest::http::{HttpFetch, ReqwestFetcher};
use jobfeed_relay::notify::pacer::{Pacer, SystemClock};
use jobfeed_relay::notify::{Dispatcher, LogSink, MessageSink, TelegramSink};
use jobfeed_relay::watermark::{FileWatermarkStore, MemoryWatermarkStore, WatermarkStore};
use jobfeed_relay::{metrics, scheduler, Adapter, Runner};

#[derive(Parser, Debug)]
#[command(name = "jobfeed-relay")]
#[command(about = "Relays new job postings from several boards to a Telegram channel")]
struct Cli {
    /// Config file (default: $RELAY_CONFIG_PATH or config/relay.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run once and exit instead of waiting for the schedule
    #[arg(long)]
    once: bool,

    /// Log messages instead of sending them; watermarks are read but never written
    #[arg(long)]
    dry_run: bool,
}

/// RUST_LOG wins, then LOG_LEVEL, then `info`. LOG_FORMAT=json switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .and_then(|v| EnvFilter::try_new(v.trim().to_lowercase()).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = RelayConfig::load(cli.config.as_deref())?;
    cfg.validate(cli.dry_run).context("invalid configuration")?;

    if let Some(addr) = cfg.metrics_socket()? {
        metrics::install_exporter(addr)?;
    }

    let http: Arc<dyn HttpFetch> = Arc::new(
        ReqwestFetcher::new(cfg.request_timeout(), &cfg.http.browser_user_agent)
            .context("building http client")?,
    );
    let keywords = Keywords::new(cfg.keywords.as_slice());
    let adapters = Adapter::registry(&cfg.sources, &keywords, http);

    let file_store = FileWatermarkStore::new(&cfg.state_dir);
    let (sink, store): (Arc<dyn MessageSink>, Arc<dyn WatermarkStore>) = if cli.dry_run {
        tracing::warn!("dry run: nothing is sent and no watermark is written");
        let ids: Vec<&str> = adapters.iter().map(|a| a.kind().as_str()).collect();
        let snapshot = MemoryWatermarkStore::snapshot_of(&file_store, &ids).await;
        (Arc::new(LogSink), Arc::new(snapshot))
    } else {
        let telegram = TelegramSink::new(&cfg.telegram.token, &cfg.telegram.channel_id)
            .with_api_base(&cfg.telegram.api_base)
            .with_timeout(cfg.request_timeout());
        (Arc::new(telegram), Arc::new(file_store))
    };

    let dispatcher = Dispatcher::new(sink, Pacer::new(cfg.send_delay(), Arc::new(SystemClock)));
    let mut runner = Runner::new(adapters, store, dispatcher).with_promo(cfg.promo.clone());

    if cli.once {
        let report = runner.run_once().await;
        tracing::info!(
            dispatched = report.dispatched(),
            failed_sources = ?report.failed_sources(),
            "single run finished"
        );
        return Ok(());
    }

    let times = scheduler::parse_times(cfg.schedule.times.as_slice())?;
    tracing::info!(
        times = ?cfg.schedule.times,
        state_dir = %cfg.state_dir.display(),
        "scheduler started"
    );
    tokio::select! {
        _ = scheduler::run_forever(&mut runner, &times) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("listening for shutdown signal")?;
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}
