// src/error.rs

//! Error taxonomy shared by the adapters, the watermark store and the dispatcher.
//!
//! Every variant is contained at the smallest scope that keeps a run going:
//! fetch errors end one source, delivery errors drop one message, persistence
//! errors degrade to "no watermark". Only `Config` stops the process.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Network failure, timeout or non-2xx response
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Malformed JSON/XML body or unusable payload shape
    #[error("decode error for {context}: {message}")]
    Decode { context: String, message: String },

    /// Credentials rejected by the upstream API
    #[error("credentials rejected by {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// Outbound channel refused or failed to accept a message
    #[error("channel delivery failed: {0}")]
    ChannelDelivery(String),

    /// Watermark could not be read or written
    #[error("watermark persistence failed for {source_id}: {message}")]
    Persistence { source_id: String, message: String },

    /// Invalid or incomplete configuration, detected before a run
    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    pub fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn auth(url: impl Into<String>, status: u16) -> Self {
        Self::Auth {
            url: url.into(),
            status,
        }
    }

    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::ChannelDelivery(message.to_string())
    }

    pub fn persistence(source_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::Auth { .. } => "auth",
            Self::ChannelDelivery(_) => "delivery",
            Self::Persistence { .. } => "persistence",
            Self::Config(_) => "config",
        }
    }
}
