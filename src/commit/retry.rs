//! Retry helper for host calls with exponential backoff

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::host::{HostError, HostResult};

/// Delay before retry number `attempt`, honouring the host's `Retry-After`
/// and adding up to 25% jitter when enabled
fn backoff(config: &RetryConfig, attempt: u32, error: &HostError) -> Duration {
    let mut delay = config.delay_for_attempt(attempt);
    if let Some(after) = error.retry_after() {
        delay = delay.max(after);
    }
    if config.jitter && !delay.is_zero() {
        let max_extra = (delay.as_millis() as u64) / 4;
        let extra = rand::rng().random_range(0..=max_extra);
        delay += Duration::from_millis(extra);
    }
    delay
}

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget (`max_attempts`, first try included) is spent
pub async fn retry_call<F, Fut, T>(config: &RetryConfig, operation_name: &str, mut operation: F) -> HostResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HostResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                if !e.is_transient() {
                    return Err(e);
                }
                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %e,
                        "Max retry attempts exceeded"
                    );
                    return Err(e);
                }

                let delay = backoff(config, attempt, &e);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> HostError {
        HostError::Server {
            status: 503,
            message: "busy".into(),
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry_call(&RetryConfig::immediate(3), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: HostResult<()> = retry_call(&RetryConfig::immediate(2), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: HostResult<()> = retry_call(&RetryConfig::immediate(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(HostError::NotFound("x".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_waits_at_least_retry_after() {
        let start = tokio::time::Instant::now();
        let calls = &AtomicU32::new(0);
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::immediate(2)
        };
        let _ = retry_call(&config, "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(HostError::RateLimited {
                    retry_after: Some(Duration::from_secs(2)),
                })
            } else {
                Ok(())
            }
        })
        .await;

        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
