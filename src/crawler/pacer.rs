//! Request pacing
//!
//! The harvester keeps exactly one request in flight, and the [`Pacer`]
//! enforces a minimum gap between the start of consecutive requests
//! (listing pages, detail pages, HEAD checks and PDF bodies alike).

use std::time::{Duration, Instant};

/// Enforces a minimum delay between outbound requests
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    last_request: Option<Instant>,
    requests: u64,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
            requests: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Raises the delay, e.g. to honor a robots.txt `Crawl-delay`; never lowers it
    pub fn raise_to(&mut self, delay: Duration) {
        if delay > self.delay {
            tracing::info!("Raising request delay from {:?} to {:?}", self.delay, delay);
            self.delay = delay;
        }
    }

    /// Number of requests paced so far
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Time left to wait at `now` before the next request may start
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self.delay.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Waits until the next request may start, then records it as started
    pub async fn wait(&mut self) {
        let wait = self.wait_time(Instant::now());
        if !wait.is_zero() {
            tracing::trace!("Pacing: sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
        self.requests += 1;
    }
}
