//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetrySettings;
use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows `attempt` (1-based)
    fn delay_for(&self, attempt: u32, transient: &TransientError) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        let backoff = Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()));
        std::cmp::max(backoff, transient.recommended_delay()).min(self.max_delay)
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: 2.0,
        }
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Rate limit exceeded (HTTP 429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Service unavailable (503)
    ServiceUnavailable,
    /// Gateway timeout (504)
    GatewayTimeout,
    /// Request timeout
    Timeout,
}

impl TransientError {
    /// Check if a SourceError represents a transient error
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit => Some(TransientError::RateLimit),
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Timeout(_) => Some(TransientError::Timeout),
            SourceError::Http { status: 503, .. } => Some(TransientError::ServiceUnavailable),
            SourceError::Http { status: 504, .. } => Some(TransientError::GatewayTimeout),
            SourceError::Http { status, .. } if *status >= 500 => Some(TransientError::ServerError),
            _ => None,
        }
    }

    /// Get the recommended delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit => Duration::from_secs(2),
            TransientError::ServiceUnavailable => Duration::from_secs(2),
            TransientError::GatewayTimeout => Duration::from_secs(1),
            TransientError::Timeout => Duration::from_secs(1),
            TransientError::Network => Duration::from_millis(500),
            TransientError::ServerError => Duration::from_millis(500),
        }
    }
}

/// Execute an async operation with retry logic
///
/// Only errors classified by [`TransientError::from_source_error`] are
/// retried; anything else is returned immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;
    let mut operation = operation;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_source_error(&error) else {
                    return Err(error);
                };

                if attempts >= config.max_attempts {
                    tracing::warn!("Operation failed after {} attempts: {}", attempts, error);
                    return Err(error);
                }

                let delay = config.delay_for(attempts, &transient);
                tracing::debug!(
                    "Transient error on attempt {}: {:?}, retrying in {:?}",
                    attempts,
                    transient,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(RetryConfig::default(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(4), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    let count = *call_count.borrow();
                    if count < 3 {
                        Err(SourceError::Network("temporary error".to_string()))
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), SourceError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(2), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(SourceError::Http {
                        status: 502,
                        message: "502 Bad Gateway".to_string(),
                    })
                }
            })
        }
        .await;

        assert!(result.is_err());
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test]
    async fn test_retry_returns_permanent_error() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<&str, SourceError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(5), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(SourceError::Parse("invalid json".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(SourceError::Parse(_))));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[test]
    fn test_transient_error_detection() {
        assert!(TransientError::from_source_error(&SourceError::RateLimit).is_some());
        assert!(
            TransientError::from_source_error(&SourceError::Network("refused".to_string()))
                .is_some()
        );
        assert_eq!(
            TransientError::from_source_error(&SourceError::Http {
                status: 503,
                message: String::new()
            }),
            Some(TransientError::ServiceUnavailable)
        );
        assert!(TransientError::from_source_error(&SourceError::Http {
            status: 404,
            message: String::new()
        })
        .is_none());
        assert!(
            TransientError::from_source_error(&SourceError::Parse("bad".to_string())).is_none()
        );
    }

    #[test]
    fn test_delay_is_capped() {
        let config = fast_config(3);
        let delay = config.delay_for(10, &TransientError::RateLimit);
        assert_eq!(delay, Duration::from_millis(20));
        assert_eq!(
            TransientError::from_source_error(&SourceError::RateLimit),
            Some(TransientError::RateLimit)
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = RetrySettings {
            max_attempts: 0,
            initial_delay_ms: 100,
            max_delay_ms: 800,
        };
        let config = RetryConfig::from(&settings);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.initial_delay, Duration::from_millis(100));
        assert_eq!(config.max_delay, Duration::from_millis(800));
    }
}
