//! Retry policy for object store requests.
//!
//! Retryable failures (see [`StorageError::is_retryable`]) are retried up to
//! `max_attempts` attempts in total. Before retry `n` (1-based) the caller
//! sleeps a uniformly random duration in `[0, min(max_backoff, base_delay * 2^n)]`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StorageError, TransferError};

/// Default total attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff scale; the ceiling before retry `n` is `base_delay * 2^n`.
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
    /// Upper bound of any single backoff.
    #[serde(with = "duration_millis")]
    pub max_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetrySettings {
    /// Set the total number of attempts (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the backoff scale.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the backoff ceiling.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Settings that retry without sleeping.
    pub fn no_delay() -> Self {
        Self::default()
            .with_base_delay(Duration::ZERO)
            .with_max_backoff(Duration::ZERO)
    }

    /// Upper bound of the sleep before retry `retry_number` (1-based).
    pub fn backoff_ceiling(&self, retry_number: u32) -> Duration {
        let factor: u32 = 1u32.checked_shl(retry_number).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Draw the jittered sleep before retry `retry_number`.
    pub fn backoff_for(&self, retry_number: u32) -> Duration {
        let ceiling: Duration = self.backoff_ceiling(retry_number);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let seconds: f64 = rand::thread_rng().gen_range(0.0..=ceiling.as_secs_f64());
        Duration::from_secs_f64(seconds)
    }
}

/// Run `operation` under the retry policy.
///
/// # Arguments
/// * `settings` - Attempt budget and backoff
/// * `key` - Object key, used for errors and logging
/// * `operation` - Produces one attempt of the request
///
/// # Errors
/// - `TransferError::Cancelled` if an attempt was cancelled (never retried)
/// - `TransferError::Fatal` for a non-retryable failure, after one attempt
/// - `TransferError::Exhausted` when every attempt failed with a retryable error
pub async fn with_retry<T, F, Fut>(
    settings: &RetrySettings,
    key: &str,
    mut operation: F,
) -> Result<T, TransferError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let max_attempts: u32 = settings.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(StorageError::Cancelled) => {
                debug!("Transfer of {} cancelled on attempt {}", key, attempt);
                return Err(TransferError::Cancelled {
                    key: key.to_string(),
                });
            }
            Err(e) if !e.is_retryable() => {
                return Err(TransferError::Fatal {
                    key: key.to_string(),
                    source: e,
                });
            }
            Err(e) if attempt >= max_attempts => {
                warn!("Giving up on {} after {} attempts: {}", key, attempt, e);
                return Err(TransferError::Exhausted {
                    key: key.to_string(),
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                let delay: Duration = settings.backoff_for(attempt);
                warn!(
                    "Attempt {}/{} for {} failed, retrying in {:?}: {}",
                    attempt, max_attempts, key, delay, e
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
