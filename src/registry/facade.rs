//! Resilience facade: `Registry::call`.
//!
//! # Call Path
//! ```text
//! call(name, op)
//!     → lookup entry                    (UnknownDependency)
//!     → breaker admission
//!         Deny → fallback | CircuitOpen
//!     → execute_with_retry(op, retry, timeout)
//!         Ok  → record success (closes a half-open breaker)
//!         Err → record ONE breaker failure → fallback | OperationFailed
//! ```
//!
//! A whole retry sequence counts as a single breaker outcome, so a breaker
//! opens after `failure_threshold` failed calls, not attempts.

use std::future::Future;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AttemptError, BoxError, CallError};
use crate::observability::metrics::{self, CallOutcome};
use crate::registry::entry::DependencyEntry;
use crate::registry::Registry;
use crate::resilience::execute_with_retry;

/// Result of a successful call, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput<T> {
    Primary(T),
    Fallback(T),
}

impl<T> CallOutput<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, CallOutput::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            CallOutput::Primary(value) | CallOutput::Fallback(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            CallOutput::Primary(value) | CallOutput::Fallback(value) => value,
        }
    }
}

impl Registry {
    /// Run `operation` against the dependency `name` with its breaker, retry,
    /// timeout and fallback policy applied.
    ///
    /// `operation` is invoked once per attempt and must build a fresh future each time.
    pub async fn call<T, F, Fut, E>(&self, name: &str, operation: F) -> Result<CallOutput<T>, CallError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let Some(entry) = self.get(name) else {
            tracing::warn!(dependency = %name, "Call to unknown dependency");
            return Err(CallError::UnknownDependency(name.to_string()));
        };

        let span = tracing::debug_span!("dependency_call", dependency = %name, call_id = %Uuid::new_v4());
        call_entry(&entry, operation).instrument(span).await
    }
}

async fn call_entry<T, F, Fut, E>(entry: &DependencyEntry, operation: F) -> Result<CallOutput<T>, CallError>
where
    T: Send + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let name = entry.name();

    if !entry.admit().is_allowed() {
        tracing::debug!("Circuit open, call rejected");
        if entry.config().fallback.is_some() {
            return run_fallback(entry, None).await;
        }
        metrics::record_call(name, CallOutcome::Rejected);
        return Err(CallError::CircuitOpen(name.to_string()));
    }

    let config = entry.config();
    match execute_with_retry(operation, &config.retry, config.timeout).await {
        Ok(value) => {
            entry.record_call_success();
            metrics::record_call(name, CallOutcome::Success);
            Ok(CallOutput::Primary(value))
        }
        Err(exhausted) => {
            entry.record_call_failure();
            tracing::warn!(
                attempts = exhausted.attempts,
                error = %exhausted.last,
                "Dependency call failed"
            );

            if config.fallback.is_some() {
                return run_fallback(entry, Some(exhausted.last)).await;
            }

            metrics::record_call(name, CallOutcome::Failure);
            Err(CallError::OperationFailed {
                name: name.to_string(),
                attempts: exhausted.attempts,
                cause: exhausted.last,
            })
        }
    }
}

/// Invoke the entry's fallback. Its outcome never touches the breaker.
async fn run_fallback<T>(entry: &DependencyEntry, primary: Option<AttemptError>) -> Result<CallOutput<T>, CallError>
where
    T: Send + 'static,
{
    let name = entry.name();
    let Some(fallback) = entry.config().fallback.as_ref() else {
        return Err(CallError::CircuitOpen(name.to_string()));
    };

    match fallback.invoke::<T>().await {
        Ok(value) => {
            tracing::warn!(primary_failed = primary.is_some(), "Served from fallback");
            metrics::record_call(name, CallOutcome::Fallback);
            Ok(CallOutput::Fallback(value))
        }
        Err(cause) => {
            tracing::error!(error = %cause, "Fallback failed");
            metrics::record_call(name, CallOutcome::FallbackFailed);
            Err(CallError::FallbackFailed {
                name: name.to_string(),
                cause,
                primary,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CircuitBreakerPolicy, RetryPolicy};
    use crate::error::FallbackTypeMismatch;
    use crate::registry::entry::{DependencyConfig, Fallback, ServiceHandle};
    use crate::resilience::BreakerState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Noop;
    impl ServiceHandle for Noop {}

    fn registry_with(config: DependencyConfig) -> Registry {
        let registry = Registry::default();
        registry.register("db", Arc::new(Noop), config);
        registry
    }

    #[test]
    fn test_call_output_accessors() {
        let out = CallOutput::Fallback(7);
        assert!(out.is_fallback());
        assert_eq!(*out.value(), 7);
        assert_eq!(CallOutput::Primary("x").into_inner(), "x");
    }

    #[tokio::test]
    async fn test_unknown_dependency() {
        let registry = Registry::default();
        let err = registry
            .call("missing", || async { Ok::<_, BoxError>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::UnknownDependency(ref n) if n == "missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sequence_is_one_breaker_failure() {
        let registry = registry_with(
            DependencyConfig::default()
                .with_retry(RetryPolicy::new(2, 10))
                .with_circuit_breaker(CircuitBreakerPolicy::new(2, 1000)),
        );
        let attempts = AtomicU32::new(0);

        let err = registry
            .call("db", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("refused") }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::OperationFailed { attempts: 3, .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        let entry = registry.get("db").unwrap();
        assert_eq!(entry.consecutive_call_failures(), 1);
        assert_eq!(entry.breaker_state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_open_breaker_serves_fallback_without_calling() {
        let registry = registry_with(
            DependencyConfig::default()
                .with_circuit_breaker(CircuitBreakerPolicy::new(1, 60_000))
                .with_fallback(Fallback::value(vec!["cached".to_string()])),
        );

        let first = registry
            .call("db", || async { Err::<Vec<String>, _>("down") })
            .await
            .unwrap();
        assert!(first.is_fallback());

        let calls = AtomicU32::new(0);
        let second = registry
            .call("db", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, BoxError>(vec![]) }
            })
            .await
            .unwrap();

        assert_eq!(second, CallOutput::Fallback(vec!["cached".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_type_mismatch() {
        let registry = registry_with(DependencyConfig::default().with_fallback(Fallback::value(0u64)));

        let err = registry
            .call("db", || async { Err::<String, _>("down") })
            .await
            .unwrap_err();

        match err {
            CallError::FallbackFailed { cause, primary, .. } => {
                assert!(cause.downcast_ref::<FallbackTypeMismatch>().is_some());
                assert!(primary.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces_as_operation_failed() {
        let registry = registry_with(DependencyConfig::default().with_timeout(Duration::from_millis(20)));

        let err = registry
            .call("db", || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, BoxError>(())
            })
            .await
            .unwrap_err();

        assert!(err.primary_error().unwrap().is_timeout());
    }
}
