//! Retry classification and capped exponential backoff
//!
//! | Condition                         | Action                    |
//! |-----------------------------------|---------------------------|
//! | Connection error / timeout        | Retry with backoff        |
//! | HTTP 429                          | Retry, honoring Retry-After |
//! | HTTP 5xx                          | Retry with backoff        |
//! | Other HTTP 4xx, redirect overflow | Fail immediately          |

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Whether a failure may succeed if the request is sent again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    Transient,
    Permanent,
}

/// Bounded retry budget with capped exponential backoff
///
/// The delay after failed attempt `n` (1-indexed) is
/// `min(base_delay * 2^(n-1), max_delay)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(800), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` counts the initial attempt and is at least 1
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Backoff before the attempt following failed attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let scaled = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Returns the delay to wait before retrying, or `None` when the budget is spent
    pub fn should_retry(&self, failure: FailureType, attempt: u32) -> Option<Duration> {
        match failure {
            FailureType::Permanent => None,
            FailureType::Transient if attempt < self.max_attempts => Some(self.delay_for(attempt)),
            FailureType::Transient => None,
        }
    }
}

/// Classifies a non-success HTTP status
pub fn classify_status(status: StatusCode) -> FailureType {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}

/// Classifies a transport-level error from reqwest
pub fn classify_error(error: &reqwest::Error) -> FailureType {
    if error.is_builder() || error.is_redirect() {
        FailureType::Permanent
    } else if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}

/// Parses a `Retry-After` header expressed in seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
