//! Retry helper for idempotent backend reads.
//!
//! Only reads are retried. Submissions are sent exactly once per
//! visitor-initiated attempt; a failed submission is surfaced to the
//! visitor, who decides whether to resubmit.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Preset: survey fetches sit on the visitor's critical path, so the
    /// delays are short (3 attempts; 300ms, 600ms between them).
    pub fn survey_fetch() -> Self {
        Self::new(3, Duration::from_millis(300))
            .with_max_delay(Duration::from_secs(2))
            .with_backoff_multiplier(2.0)
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::survey_fetch()
    }
}

/// Execute an async operation with retries, using a predicate to decide
/// whether an error is worth retrying.
///
/// Transient failures (5xx, rate limiting, network errors) should retry;
/// client errors should not.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut last_error: Option<E> = None;

    for attempt in 0..config.max_attempts {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                config.max_attempts,
                delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "{}: Succeeded on attempt {}/{}",
                        operation_name,
                        attempt + 1,
                        config.max_attempts
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    debug!("{}: Not retrying after error: {}", operation_name, e);
                    return Err(e);
                }

                let remaining = config.max_attempts - attempt - 1;
                if remaining > 0 {
                    warn!(
                        "{}: Attempt {}/{} failed ({}), {} retries remaining",
                        operation_name,
                        attempt + 1,
                        config.max_attempts,
                        e,
                        remaining
                    );
                } else {
                    warn!(
                        "{}: All {} attempts failed. Last error: {}",
                        operation_name, config.max_attempts, e
                    );
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.expect("At least one attempt should have been made"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ==================== Config Tests ====================

    #[test]
    fn test_delay_for_attempt_backoff() {
        let config = RetryConfig::new(5, Duration::from_millis(100));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped_at_max() {
        let config =
            RetryConfig::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(2));

        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(2));
    }

    #[test]
    fn test_survey_fetch_preset() {
        let config = RetryConfig::survey_fetch();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_delay, Duration::from_millis(300));
    }

    // ==================== Retry Behavior Tests ====================

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::new(3, Duration::from_millis(1)),
            "test",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::new(3, Duration::from_millis(1)),
            "test",
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(7)
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::new(3, Duration::from_millis(1)),
            "test",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("always".to_string())
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("always".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_predicate_stops_retries() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::new(5, Duration::from_millis(1)),
            "test",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("permanent".to_string())
            },
            |e| !e.contains("permanent"),
        )
        .await;

        assert_eq!(result, Err("permanent".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
