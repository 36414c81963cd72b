//! Bounded exponential backoff for provider transport calls.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::TransportError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// No retries, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Wait before retry number `attempt` (1-based): initial * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms)
            .max(self.initial_backoff_ms.min(self.max_backoff_ms));
        Duration::from_millis(ms)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Result<T, TransportError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    let wait = self.backoff(attempt);
                    warn!(attempt, error = %e, wait_ms = wait.as_millis() as u64, "retrying provider call");
                    std::thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
