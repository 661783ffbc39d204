//! Retry with exponential backoff for unary operations.
//!
//! Streaming calls are never retried once the first byte has been delivered
//! to the caller.

use crate::config::RetryConfig;
use crate::error::InferenceError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy implementation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute an operation, retrying retryable failures.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, InferenceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() || attempt >= self.config.max_retries => {
                    return Err(e);
                }
                Err(e) => {
                    let delay = e
                        .retry_after()
                        .unwrap_or_else(|| self.calculate_delay(attempt))
                        .min(self.config.max_delay);

                    debug!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Calculate backoff delay for a given attempt.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as f64;
        let multiplier = self.config.multiplier.powi(attempt as i32);
        let delay_ms = (base * multiplier).min(self.config.max_delay.as_millis() as f64) as u64;

        let delay = if self.config.jitter {
            // Up to 20% extra.
            Duration::from_millis(delay_ms + rand_jitter(delay_ms / 5))
        } else {
            Duration::from_millis(delay_ms)
        };

        delay.min(self.config.max_delay)
    }
}

fn rand_jitter(max: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hash = RandomState::new().build_hasher().finish();
    hash % (max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NetworkError, RequestError, ServerError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_retry_delay_calculation() {
        let policy = RetryPolicy::new(RetryConfig {
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            jitter: false,
            ..Default::default()
        });

        assert_eq!(policy.calculate_delay(0).as_millis(), 100);
        assert_eq!(policy.calculate_delay(1).as_millis(), 200);
        assert_eq!(policy.calculate_delay(2).as_millis(), 400);
        assert_eq!(policy.calculate_delay(20), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let policy = RetryPolicy::new(RetryConfig {
            base_delay: Duration::from_millis(100),
            jitter: true,
            ..Default::default()
        });
        for _ in 0..20 {
            let delay = policy.calculate_delay(0).as_millis();
            assert!((100..=120).contains(&delay));
        }
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(fast_config(3));

        let result = policy
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(InferenceError::Server(ServerError::InternalError {
                        message: None,
                        request_id: None,
                    }))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_validation() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(fast_config(3));

        let result: Result<(), _> = policy
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InferenceError::Request(RequestError::Validation {
                    message: "bad".into(),
                    request_id: None,
                }))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(fast_config(2));

        let result: Result<(), _> = policy
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InferenceError::Network(NetworkError::Timeout {
                    duration: Duration::from_secs(1),
                }))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
