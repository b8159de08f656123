// src/watermark.rs
//! Per-source delivery watermark and its persistent store.
//!
//! A watermark is the publish time of the newest posting already delivered
//! for one source. It only ever moves forward. The file store keeps one JSON
//! record per source so that sources never share a failure domain:
//!
//! ```json
//! {"last_published_date": "2024-01-02T10:00:00+00:00"}
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::dates::parse_absolute;
use crate::error::{RelayError, Result};

/// Newest delivered publish time for one source; `None` accepts everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark(Option<DateTime<Utc>>);

impl Watermark {
    pub fn new(last_published_at: Option<DateTime<Utc>>) -> Self {
        Self(last_published_at)
    }

    pub fn at(ts: DateTime<Utc>) -> Self {
        Self(Some(ts))
    }

    pub fn last_published_at(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Strictly newer than the watermark (or no watermark yet).
    pub fn is_newer(&self, ts: &DateTime<Utc>) -> bool {
        match self.0 {
            None => true,
            Some(last) => *ts > last,
        }
    }

    /// Monotonic max-update. Returns `true` if the watermark moved.
    pub fn advance(&mut self, ts: DateTime<Utc>) -> bool {
        if self.is_newer(&ts) {
            self.0 = Some(ts);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WatermarkRecord {
    last_published_date: String,
}

/// Persistence for per-source watermarks.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Missing or unreadable records yield an empty watermark (logged, never an error).
    async fn load(&self, source_id: &str) -> Watermark;

    /// Last-writer-wins per source.
    async fn save(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()>;
}

/// One JSON file per source under a state directory.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    dir: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("last_published_{source_id}.json"))
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn load(&self, source_id: &str) -> Watermark {
        let path = self.path_for(source_id);
        let content = match fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(source = source_id, "no watermark yet");
                return Watermark::default();
            }
            Err(e) => {
                tracing::warn!(source = source_id, path = %path.display(), error = %e, "watermark unreadable, starting from scratch");
                return Watermark::default();
            }
        };

        let record: WatermarkRecord = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(source = source_id, path = %path.display(), error = %e, "watermark corrupt, starting from scratch");
                return Watermark::default();
            }
        };

        match parse_absolute(&record.last_published_date) {
            Some(ts) => Watermark::at(ts),
            None => {
                tracing::warn!(
                    source = source_id,
                    value = %record.last_published_date,
                    "watermark timestamp unparseable, starting from scratch"
                );
                Watermark::default()
            }
        }
    }

    async fn save(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()> {
        let record = WatermarkRecord {
            last_published_date: ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        };
        let body = serde_json::to_vec(&record)
            .map_err(|e| RelayError::persistence(source_id, e))?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RelayError::persistence(source_id, e))?;

        // write-then-rename so a crash never leaves a half-written record
        let path = self.path_for(source_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &body)
            .await
            .map_err(|e| RelayError::persistence(source_id, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(RelayError::persistence(source_id, e));
        }

        tracing::debug!(source = source_id, watermark = %record.last_published_date, "watermark saved");
        Ok(())
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    inner: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source_id: &str, ts: DateTime<Utc>) -> Self {
        self.inner
            .lock()
            .expect("watermark mutex poisoned")
            .insert(source_id.to_string(), ts);
        self
    }

    /// Copy the current watermarks of `source_ids` out of another store.
    pub async fn snapshot_of(store: &dyn WatermarkStore, source_ids: &[&str]) -> Self {
        let mem = Self::new();
        for id in source_ids {
            if let Some(ts) = store.load(id).await.last_published_at() {
                mem.inner
                    .lock()
                    .expect("watermark mutex poisoned")
                    .insert(id.to_string(), ts);
            }
        }
        mem
    }

    pub fn get(&self, source_id: &str) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .expect("watermark mutex poisoned")
            .get(source_id)
            .copied()
    }
}

#[async_trait]
impl WatermarkStore for MemoryWatermarkStore {
    async fn load(&self, source_id: &str) -> Watermark {
        Watermark::new(self.get(source_id))
    }

    async fn save(&self, source_id: &str, ts: DateTime<Utc>) -> Result<()> {
        self.inner
            .lock()
            .expect("watermark mutex poisoned")
            .insert(source_id.to_string(), ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn empty_watermark_accepts_everything() {
        let wm = Watermark::default();
        assert!(wm.is_newer(&Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn equal_timestamp_is_not_newer() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let wm = Watermark::at(t);
        assert!(!wm.is_newer(&t));
        assert!(wm.is_newer(&(t + chrono::Duration::seconds(1))));
    }

    #[test]
    fn comparison_ignores_offset_representation() {
        let plus3 = FixedOffset::east_opt(3 * 3600).unwrap();
        let w_local = plus3.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let w_utc = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let a = Watermark::at(w_local.with_timezone(&Utc));
        let b = Watermark::at(w_utc);
        assert_eq!(a, b);

        let minus5 = FixedOffset::west_opt(5 * 3600).unwrap();
        let t = minus5.with_ymd_and_hms(2023, 12, 31, 19, 0, 1).unwrap();
        let t = t.with_timezone(&Utc);
        assert_eq!(a.is_newer(&t), b.is_newer(&t));
        assert!(a.is_newer(&t));
    }

    #[test]
    fn advance_never_moves_backwards() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut wm = Watermark::default();
        assert!(wm.advance(t1));
        assert!(!wm.advance(t0));
        assert!(!wm.advance(t1));
        assert_eq!(wm.last_published_at(), Some(t1));
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let store = MemoryWatermarkStore::new();
        assert_eq!(store.load("rss").await, Watermark::default());
        store.save("rss", t).await.unwrap();
        assert_eq!(store.load("rss").await, Watermark::at(t));
        assert_eq!(store.load("remoteok").await, Watermark::default());
    }
}
