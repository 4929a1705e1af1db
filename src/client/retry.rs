//! Retry with exponential backoff

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::RetryConfig;

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = Arc<dyn Fn(&ApiError) -> bool + Send + Sync>;

/// Backoff stops doubling after 2^16 times the base delay
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Governs one logical operation. Cheap to clone.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Default predicate: network failures, timeouts and HTTP 5xx.
    /// `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retryable: Arc::new(ApiError::is_transient),
        }
    }

    /// Single attempt, no retry
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
            .retry_rate_limited(config.retry_on_429)
    }

    /// Also retry HTTP 429 on top of the default predicate
    pub fn retry_rate_limited(self, enabled: bool) -> Self {
        if !enabled {
            return self;
        }
        self.with_predicate(|e| e.is_transient() || e.status() == Some(429))
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ApiError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn is_retryable(&self, error: &ApiError) -> bool {
        (self.retryable)(error)
    }

    /// Delay before attempt `attempt` (1-based): zero for the first,
    /// then `base_delay * 2^(attempt - 2)` with the exponent capped.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 2).min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts()` is exhausted. The last error is returned as is.
pub async fn with_retry<T, F, Fut>(operation: F, policy: &RetryPolicy) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    run(operation, policy).await.0
}

/// Like [`with_retry`], also returning the number of attempts made
pub(crate) async fn run<T, F, Fut>(mut operation: F, policy: &RetryPolicy) -> (Result<T, ApiError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return (Ok(value), attempt);
            }
            Err(e) => {
                if attempt >= policy.max_attempts || !policy.is_retryable(&e) {
                    return (Err(e), attempt);
                }

                let backoff = policy.delay_before(attempt + 1);
                warn!(attempt, error = %e, backoff_ms = backoff.as_millis() as u64, "Operation failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
