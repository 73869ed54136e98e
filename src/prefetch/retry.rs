//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CacheError, Result};

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each following one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay slept after failed attempt number `attempt` (zero based):
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl From<&Config> for RetryPolicy {
    fn from(config: &Config) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

// == Retry With Backoff ==
/// Runs `op` until it succeeds or `max_retries` retries have failed.
///
/// `op` receives the zero based attempt number. When every attempt fails the
/// last error is logged and `RetriesExhausted` is returned.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, key: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                debug!(
                    "Attempt {} for '{}' failed ({}), retrying in {:?}",
                    attempt + 1,
                    key,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                warn!("Giving up on '{}' after {} attempts: {}", key, attempt + 1, err);
                return Err(CacheError::RetriesExhausted {
                    key: key.to_string(),
                    attempts: attempt + 1,
                });
            }
        }
    }
}
