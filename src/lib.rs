// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod annotate;
pub mod config;
pub mod dates;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod text;
pub mod watermark;

// ---- Re-exports for stable public API ----
pub use crate::config::RelayConfig;
pub use crate::error::{RelayError, Result};
pub use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
pub use crate::ingest::Adapter;
pub use crate::notify::{Ack, Dispatcher, LogSink, MessageSink, TelegramSink};
pub use crate::pipeline::{RunReport, Runner, SourceReport};
pub use crate::watermark::{FileWatermarkStore, MemoryWatermarkStore, Watermark, WatermarkStore};
