// src/ingest/http.rs
//! HTTP transport used by the adapters.
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpFetch`]. The
//! reqwest implementation owns two clients: a plain one and one that looks
//! like a desktop browser (some job boards reject non-browser agents).
//! Every request is bounded by the client timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RelayError, Result};

pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const STANDARD_USER_AGENT: &str = concat!("jobfeed-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientProfile {
    #[default]
    Standard,
    /// Browser user agent, follows redirects.
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<Value>,
    pub profile: ClientProfile,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json: None,
            profile: ClientProfile::Standard,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            json: Some(body),
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn profile(mut self, profile: ClientProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Perform the request. Only transport-level failures are errors here;
    /// status handling happens in [`fetch_text`].
    async fn execute(&self, req: &HttpRequest) -> Result<HttpResponse>;
}

/// Execute and map the status: 401/403 → `Auth`, other non-2xx → `Transport`.
pub async fn fetch_text(http: &dyn HttpFetch, req: &HttpRequest) -> Result<String> {
    let resp = http.execute(req).await?;
    match resp.status {
        200..=299 => Ok(resp.body),
        401 | 403 => Err(RelayError::auth(&req.url, resp.status)),
        status => Err(RelayError::transport(
            &req.url,
            format!("HTTP {status}: {}", snippet(&resp.body)),
        )),
    }
}

/// [`fetch_text`] followed by JSON decoding (`Decode` on failure).
pub async fn fetch_json<T: DeserializeOwned>(http: &dyn HttpFetch, req: &HttpRequest) -> Result<T> {
    let body = fetch_text(http, req).await?;
    serde_json::from_str(&body).map_err(|e| RelayError::decode(&req.url, e))
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    standard: Client,
    browser: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration, browser_user_agent: &str) -> Result<Self> {
        let standard = Client::builder()
            .user_agent(STANDARD_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::config(format!("http client: {e}")))?;
        let browser = Client::builder()
            .user_agent(browser_user_agent)
            .redirect(redirect::Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::config(format!("browser http client: {e}")))?;
        Ok(Self { standard, browser })
    }

    fn client(&self, profile: ClientProfile) -> &Client {
        match profile {
            ClientProfile::Standard => &self.standard,
            ClientProfile::Browser => &self.browser,
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn execute(&self, req: &HttpRequest) -> Result<HttpResponse> {
        let client = self.client(req.profile);
        let mut builder = match req.method {
            Method::Get => client.get(&req.url),
            Method::Post => client.post(&req.url),
        };
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        for (k, v) in &req.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(body) = &req.json {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.without_url().to_string()
            };
            RelayError::transport(&req.url, message)
        })?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| RelayError::transport(&req.url, e.without_url()))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(HttpResponse);

    #[async_trait]
    impl HttpFetch for Canned {
        async fn execute(&self, _req: &HttpRequest) -> Result<HttpResponse> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth() {
        let http = Canned(HttpResponse::with_status(401, "nope"));
        let err = fetch_text(&http, &HttpRequest::get("https://api.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Auth { status: 401, .. }));
    }

    #[tokio::test]
    async fn server_error_maps_to_transport() {
        let http = Canned(HttpResponse::with_status(503, "busy"));
        let err = fetch_text(&http, &HttpRequest::get("https://api.test"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn malformed_json_maps_to_decode() {
        let http = Canned(HttpResponse::ok("{not json"));
        let err = fetch_json::<Value>(&http, &HttpRequest::get("https://api.test"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn builder_collects_query_and_headers() {
        let req = HttpRequest::get("https://api.test")
            .query("page", "2")
            .header("X-RapidAPI-Key", "k")
            .profile(ClientProfile::Browser);
        assert_eq!(req.query_param("page"), Some("2"));
        assert_eq!(req.header_value("x-rapidapi-key"), Some("k"));
        assert_eq!(req.profile, ClientProfile::Browser);
    }
}
