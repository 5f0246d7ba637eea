//! Resubscribe-after-delay retry policy.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How often, and how far apart, a failed request is rebuilt and re-issued.
///
/// The default makes a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first; `None` retries until success.
    pub max_attempts: Option<u32>,
    /// Pause between a failure and the next attempt, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: Some(1),
            delay_ms: 0,
        }
    }

    /// At most `max_attempts` attempts, `delay` apart.
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay_ms: duration_millis(delay),
        }
    }

    /// Retry until success, `delay` apart.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay_ms: duration_millis(delay),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max.max(1))
    }

    /// Await `make()` until it succeeds or the policy gives up, building a fresh future for
    /// every attempt. Returns the last error when attempts run out.
    pub async fn run<F, Fut, O, E>(&self, mut make: F) -> Result<O, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match make().await {
                Ok(value) => return Ok(value),
                Err(err) if self.exhausted(attempt) => return Err(err),
                Err(err) => {
                    warn!(attempt, delay_ms = self.delay_ms, error = %err, "attempt failed, retrying");
                }
            }
            tokio::time::sleep(self.delay()).await;
            attempt += 1;
        }
    }
}

fn duration_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
