// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobfeed_relay::ingest::http::{HttpFetch, HttpRequest, HttpResponse};
use jobfeed_relay::notify::pacer::{ManualClock, Pacer};
use jobfeed_relay::{Ack, Dispatcher, MessageSink, RelayError, Result};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// Scripted upstream: every request is logged, the handler decides the reply.
pub struct FakeHttp {
    handler: Box<Handler>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl FakeHttp {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Route by URL prefix; anything unmatched is a 404.
    pub fn routes(routes: Vec<(&'static str, HttpResponse)>) -> Arc<Self> {
        Self::new(move |req| {
            for (prefix, resp) in &routes {
                if req.url.starts_with(prefix) {
                    return Ok(resp.clone());
                }
            }
            Ok(HttpResponse::with_status(404, "not found"))
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpFetch for FakeHttp {
    async fn execute(&self, req: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(req.clone());
        (self.handler)(req)
    }
}

/// Collects delivered messages; sends whose index is in `fail_on` are rejected.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
    fail_on: HashSet<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(indices: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            fail_on: indices.iter().copied().collect(),
            ..Default::default()
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<Ack> {
        let idx = {
            let mut n = self.attempts.lock().unwrap();
            let idx = *n;
            *n += 1;
            idx
        };
        if self.fail_on.contains(&idx) {
            return Err(RelayError::delivery(format!("Bad Request: send #{idx} rejected")));
        }
        let mut msgs = self.messages.lock().unwrap();
        msgs.push(text.to_string());
        Ok(Ack {
            message_id: Some(msgs.len() as i64),
        })
    }
}

/// Dispatcher over `sink` with a virtual clock, so pacing never sleeps for real.
pub fn dispatcher(sink: Arc<dyn MessageSink>, delay: Duration) -> (Dispatcher, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Dispatcher::new(sink, Pacer::new(delay, clock.clone())), clock)
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

pub fn json_fixture(name: &str) -> HttpResponse {
    HttpResponse::ok(fixture(name))
}
