// src/error_recovery.rs
//! Retry with bounded backoff for remote calls.
//!
//! One policy is built at startup and injected into every HTTP call site.
//! Only transient failures (429, 5xx, connection errors) are retried; a
//! `Retry-After` sent by the server overrides the computed delay.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// delay = base * attempt
    Linear,
    /// delay = base * 2^(attempt - 1)
    Exponential,
}

/// Retry configuration for transient remote failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let raw = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        };
        raw.min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget runs out. The last error is returned on exhaustion.
    pub async fn run<F, T, Fut>(&self, label: &str, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt == max_attempts => {
                    log::error!("{} failed after {} attempts: {}", label, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = e.retry_after().unwrap_or_else(|| self.delay_for(attempt));
                    log::warn!(
                        "{} attempt {}/{} failed ({}), retrying after {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(AppError::RetriesExhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotionErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff: Backoff::Linear,
        }
    }

    fn notion_error(status: u16) -> AppError {
        AppError::NotionService {
            code: NotionErrorCode::from_http_status(status),
            message: format!("HTTP {}", status),
            status,
            retry_after: None,
        }
    }

    #[test]
    fn linear_and_exponential_schedules() {
        let linear = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            backoff: Backoff::Linear,
            ..RetryPolicy::default()
        };
        assert_eq!(linear.delay_for(1), Duration::from_millis(100));
        assert_eq!(linear.delay_for(2), Duration::from_millis(200));
        assert_eq!(linear.delay_for(3), Duration::from_millis(250));

        let exponential = RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Exponential,
            ..RetryPolicy::default()
        };
        assert_eq!(exponential.delay_for(1), Duration::from_secs(1));
        assert_eq!(exponential.delay_for(4), Duration::from_secs(8));
        assert_eq!(exponential.delay_for(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = instant_policy(5)
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(notion_error(503))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = instant_policy(5)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(notion_error(404)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = instant_policy(4)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(notion_error(429)) }
            })
            .await;
        assert!(matches!(
            result,
            Err(AppError::NotionService { status: 429, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
