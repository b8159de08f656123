// src/config/mod.rs
//! Relay configuration: TOML file first, then environment overrides.
//!
//! Lookup order for the file:
//! 1) explicit path (`--config`)
//! 2) `$RELAY_CONFIG_PATH`
//! 3) `config/relay.toml`
//! 4) built-in defaults
//!
//! Environment names follow the deployment's `.env` (`TELEGRAM_TOKEN`,
//! `CHANNEL_ID`, `RSS_FEEDS`, `HH_URL`, ...).

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::error::{RelayError, Result};
use crate::ingest::config::{split_list, SourcesConfig};
use crate::ingest::http::DEFAULT_BROWSER_USER_AGENT;
use crate::notify::telegram::DEFAULT_API_BASE;
use crate::scheduler::{parse_times, DEFAULT_TIMES};

pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub channel_id: String,
    /// Minimum spacing between messages.
    pub send_delay_secs: u64,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            send_delay_secs: 10,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub browser_user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            browser_user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local wall-clock times, `HH:MM`.
    pub times: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            times: DEFAULT_TIMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub telegram: TelegramConfig,
    pub http: HttpConfig,
    pub schedule: ScheduleConfig,
    pub state_dir: PathBuf,
    /// Global keyword list, inherited by the client-side filtering sources.
    pub keywords: Vec<String>,
    /// Rotating promotional messages, one sent per run.
    pub promo: Vec<String>,
    pub metrics_addr: Option<String>,
    pub sources: SourcesConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            http: HttpConfig::default(),
            schedule: ScheduleConfig::default(),
            state_dir: PathBuf::from("state"),
            keywords: Vec::new(),
            promo: Vec::new(),
            metrics_addr: None,
            sources: SourcesConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Resolve the config file, parse it and apply process environment overrides.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match resolve_path(explicit)? {
            Some(path) => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("reading config from {}", path.display()))?;
                let cfg = Self::from_toml_str(&content)
                    .with_context(|| format!("parsing config {}", path.display()))?;
                tracing::info!(path = %path.display(), "config loaded");
                cfg
            }
            None => {
                tracing::info!("no config file, using defaults and environment");
                Self::default()
            }
        };
        cfg.apply_env().context("applying environment overrides")?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|k| std::env::var(k).ok())
    }

    /// Apply overrides from any key lookup. Blank values are ignored.
    pub fn apply_env_from<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = var("TELEGRAM_TOKEN") {
            self.telegram.token = v;
        }
        if let Some(v) = var("CHANNEL_ID") {
            self.telegram.channel_id = v;
        }
        if let Some(v) = var("SEND_DELAY_SECS") {
            self.telegram.send_delay_secs = parse_secs("SEND_DELAY_SECS", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_secs("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("RSS_USER_AGENT") {
            self.http.browser_user_agent = v;
        }
        if let Some(v) = var("KEYWORDS") {
            self.keywords = split_list(&v);
        }
        if let Some(v) = var("STATE_DIR") {
            self.state_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SCHEDULE_TIMES") {
            self.schedule.times = split_list(&v);
        }
        if let Some(v) = var("METRICS_ADDR") {
            self.metrics_addr = Some(v);
        }

        let s = &mut self.sources;
        if let Some(v) = var("RSS_FEEDS") {
            s.rss.get_or_insert_with(Default::default).feeds = split_list(&v);
        }
        if let Some(v) = var("JSON_FEED") {
            s.remoteok.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = var("WORKINGNOMADS") {
            s.working_nomads.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = var("HH_URL") {
            s.headhunter.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = var("HF_URL") {
            s.hiring_cafe.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = var("JOBAPI_URL") {
            s.rapid_jobs.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = var("RAPIDKEY") {
            s.rapid_jobs.get_or_insert_with(Default::default).api_key = Some(v);
        }
        if let Some(v) = var("RAPIDHOST") {
            s.rapid_jobs.get_or_insert_with(Default::default).api_host = Some(v);
        }
        Ok(())
    }

    /// Checked once at startup. Dry runs don't need channel credentials.
    pub fn validate(&self, dry_run: bool) -> Result<()> {
        if !dry_run {
            if self.telegram.token.trim().is_empty() {
                return Err(RelayError::config("TELEGRAM_TOKEN is not set"));
            }
            if self.telegram.channel_id.trim().is_empty() {
                return Err(RelayError::config("CHANNEL_ID is not set"));
            }
        }
        if self.sources.enabled_count() == 0 {
            return Err(RelayError::config(
                "no source endpoint configured (RSS_FEEDS, JSON_FEED, WORKINGNOMADS, HH_URL, HF_URL or JOBAPI_URL)",
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(RelayError::config("request timeout must be at least 1 second"));
        }
        parse_times(self.schedule.times.as_slice())?;
        self.metrics_socket()?;
        Ok(())
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_secs(self.telegram.send_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn metrics_socket(&self) -> Result<Option<SocketAddr>> {
        self.metrics_addr
            .as_deref()
            .map(|a| {
                a.parse::<SocketAddr>()
                    .map_err(|e| RelayError::config(format!("METRICS_ADDR {a:?}: {e}")))
            })
            .transpose()
    }
}

fn parse_secs(key: &str, v: &str) -> Result<u64> {
    v.parse()
        .map_err(|_| RelayError::config(format!("{key} must be a whole number of seconds, got {v:?}")))
}

fn resolve_path(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(p) = explicit {
        if !p.exists() {
            return Err(anyhow!("config file {} does not exist", p.display()));
        }
        return Ok(Some(p.to_path_buf()));
    }
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}
