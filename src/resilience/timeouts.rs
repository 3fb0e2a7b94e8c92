//! Timeout enforcement.
//!
//! Every attempt, whether a call, a health check or an initialization, goes
//! through `run_with_timeout`. Exceeding the deadline drops the waiting future;
//! whatever work the collaborator already started is not guaranteed to stop.

use std::future::Future;
use std::time::Duration;

use crate::error::{AttemptError, BoxError};

/// Race `fut` against a `limit` deadline.
pub async fn run_with_timeout<F, T, E>(limit: Duration, fut: F) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AttemptError::Failed(e.into())),
        Err(_) => Err(AttemptError::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_future_times_out() {
        let result = run_with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, BoxError>(())
        })
        .await;

        assert!(matches!(result, Err(AttemptError::TimedOut(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_error_is_wrapped() {
        let result: Result<(), _> =
            run_with_timeout(Duration::from_secs(1), async { Err::<(), _>("boom") }).await;

        match result {
            Err(AttemptError::Failed(e)) => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_value_passes_through() {
        let value = run_with_timeout(Duration::from_secs(1), async { Ok::<_, BoxError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
