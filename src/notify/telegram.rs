// src/notify/telegram.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Ack, MessageSink};
use crate::error::{RelayError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API `sendMessage` client for one chat.
#[derive(Clone)]
pub struct TelegramSink {
    token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

// the token is part of the URL; errors are reported without it
#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<Ack> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::delivery(format!("request failed: {}", e.without_url())))?;

        let status = rsp.status();
        let raw = rsp
            .text()
            .await
            .map_err(|e| RelayError::delivery(format!("reading response: {}", e.without_url())))?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&raw).ok();

        match parsed {
            Some(ApiResponse {
                ok: true, result, ..
            }) if status.is_success() => Ok(Ack {
                message_id: result.map(|r| r.message_id),
            }),
            Some(r) => Err(RelayError::delivery(format!(
                "telegram rejected message (HTTP {}, code {}): {}",
                status.as_u16(),
                r.error_code.unwrap_or_default(),
                r.description.unwrap_or_default()
            ))),
            None => Err(RelayError::delivery(format!(
                "unexpected telegram response (HTTP {})",
                status.as_u16()
            ))),
        }
    }
}
