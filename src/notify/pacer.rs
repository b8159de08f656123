// src/notify/pacer.rs
//! Minimum spacing between consecutive channel sends.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, d: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// Clock that only moves when slept on. Records every sleep.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, d: Duration) {
        *self.offset.lock().expect("clock mutex poisoned") += d;
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().expect("clock mutex poisoned")
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock mutex poisoned").clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    async fn sleep(&self, d: Duration) {
        self.sleeps.lock().expect("clock mutex poisoned").push(d);
        self.advance(d);
    }
}

pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl Pacer {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            last: None,
            clock,
        }
    }

    /// Wait until at least `interval` has passed since the previous call.
    /// The first call returns immediately.
    pub async fn ready(&mut self) {
        if let Some(last) = self.last {
            let since = self.clock.now().saturating_duration_since(last);
            if since < self.interval {
                let wait = self.interval - since;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "pacing channel send");
                self.clock.sleep(wait).await;
            }
        }
        self.last = Some(self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_send_does_not_wait() {
        let clock = Arc::new(ManualClock::new());
        let mut p = Pacer::new(Duration::from_secs(10), clock.clone());
        p.ready().await;
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn waits_only_for_the_remainder() {
        let clock = Arc::new(ManualClock::new());
        let mut p = Pacer::new(Duration::from_secs(10), clock.clone());
        p.ready().await;
        clock.advance(Duration::from_secs(4));
        p.ready().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(6)]);

        clock.advance(Duration::from_secs(30));
        p.ready().await;
        assert_eq!(clock.sleeps().len(), 1);
    }
}
