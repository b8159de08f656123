// src/notify/mod.rs
//! Outbound delivery: the sink abstraction, a log-only sink for dry runs,
//! and the paced dispatcher that is the single writer to the channel.

pub mod pacer;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use crate::error::Result;
use crate::metrics as m;
use crate::notify::pacer::Pacer;

pub use crate::notify::telegram::TelegramSink;

/// Channel acknowledgement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack {
    pub message_id: Option<i64>,
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<Ack>;
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn send(&self, text: &str) -> Result<Ack> {
        tracing::info!(target: "relay::dry_run", message = %text, "message not sent (dry run)");
        Ok(Ack::default())
    }
}

pub struct Dispatcher {
    sink: Arc<dyn MessageSink>,
    pacer: Pacer,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn MessageSink>, pacer: Pacer) -> Self {
        Self { sink, pacer }
    }

    /// Paced send of one message. A failure is logged and returned; it
    /// does not affect later sends.
    pub async fn send(&mut self, source: &'static str, text: &str) -> Result<Ack> {
        self.pacer.ready().await;
        match self.sink.send(text).await {
            Ok(ack) => {
                tracing::info!(source, message_id = ?ack.message_id, "message delivered");
                counter!(m::DISPATCHED_TOTAL, "source" => source).increment(1);
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "message delivery failed");
                counter!(m::DISPATCH_ERRORS_TOTAL, "source" => source).increment(1);
                Err(e)
            }
        }
    }
}
