//! Retry executor.
//!
//! # Responsibilities
//! - Run an operation with a per-attempt timeout
//! - Retry failures with exponential backoff + jitter
//! - Stop after `max_retries` retries and hand back the last error
//!
//! A timeout counts as a failed attempt exactly like an operation error.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::RetryPolicy;
use crate::error::{AttemptError, BoxError};
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::timeouts::run_with_timeout;

/// All attempts failed.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s)")]
pub struct RetryExhausted {
    /// Attempts made, including the first.
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}

/// Execute `operation` under `policy`, bounding each attempt by `timeout`.
pub async fn execute_with_retry<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let mut attempt: u32 = 0;

    loop {
        let err = match run_with_timeout(timeout, operation()).await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if attempt >= policy.max_retries {
            return Err(RetryExhausted {
                attempts: attempt + 1,
                last: err,
            });
        }

        let delay = calculate_backoff(attempt, policy.backoff_base_ms, policy.max_backoff_ms);
        tracing::debug!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt failed, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_attempts_and_delays() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();

        let result = execute_with_retry(
            || {
                seen.lock().unwrap().push(Instant::now());
                async { Err::<(), _>("always down") }
            },
            &RetryPolicy::new(3, 100),
            Duration::from_secs(1),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert!(matches!(err.last, AttemptError::Failed(_)));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<u128> = calls.windows(2).map(|w| (w[1] - w[0]).as_millis()).collect();
        assert!(gaps[0] >= 100 && gaps[0] < 200, "gaps: {gaps:?}");
        assert!(gaps[1] >= 200 && gaps[1] < 400, "gaps: {gaps:?}");
        assert!(gaps[2] >= 400 && gaps[2] < 800, "gaps: {gaps:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_one_attempt() {
        let count = AtomicU32::new(0);
        let result = execute_with_retry(
            || {
                count.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("nope") }
            },
            &RetryPolicy::default(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_retrying() {
        let count = AtomicU32::new(0);
        let value = execute_with_retry(
            || {
                let n = count.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(n)
                    }
                }
            },
            &RetryPolicy::new(5, 10),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let count = AtomicU32::new(0);
        let result = execute_with_retry(
            || {
                count.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok::<_, BoxError>(())
                }
            },
            &RetryPolicy::new(1, 10),
            Duration::from_millis(50),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 2);
        assert!(err.last.is_timeout());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
