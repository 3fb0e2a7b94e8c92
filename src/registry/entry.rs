//! Registered dependency: handle, policy and mutable runtime state.
//!
//! # Responsibilities
//! - Define what a wrapped collaborator must provide (`ServiceHandle`)
//! - Carry the immutable policy attached at registration (`DependencyConfig`)
//! - Serialize all breaker and health mutations behind one per-entry lock
//!
//! The lock is a `std::sync::Mutex` held only for plain field updates, never
//! across an await, so contention between callers and the monitor is brief and
//! calls to one dependency never wait on another.

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use crate::config::{CircuitBreakerPolicy, PolicyDefaults, RetryPolicy};
use crate::error::{BoxError, FallbackTypeMismatch};
use crate::health::report::{unix_millis, DependencyHealth};
use crate::health::state::{HealthRecord, HealthStatus};
use crate::observability::metrics;
use crate::resilience::{Admission, BreakerState, CircuitBreaker};

/// A collaborator wrapped by the registry.
///
/// Both hooks default to no-ops.
#[async_trait]
pub trait ServiceHandle: Send + Sync + 'static {
    /// Bring the service up. Bounded by the dependency's `timeout`.
    async fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Release resources on `unregister` / `shutdown`. Errors are logged, not thrown.
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

type HealthFn = dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync;

/// Zero-argument health probe.
#[derive(Clone)]
pub struct HealthCheck(Arc<HealthFn>);

impl HealthCheck {
    pub fn new<F, Fut, E>(check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self(Arc::new(move || {
            let fut = check();
            async move {
                let result: Result<(), BoxError> = fut.await.map_err(Into::into);
                result
            }
            .boxed()
        }))
    }

    /// A probe that always succeeds.
    pub fn always_healthy() -> Self {
        Self(Arc::new(|| async { Ok::<(), BoxError>(()) }.boxed()))
    }

    pub fn invoke(&self) -> BoxFuture<'static, Result<(), BoxError>> {
        (self.0)()
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::always_healthy()
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HealthCheck(..)")
    }
}

type FallbackFn = dyn Fn() -> BoxFuture<'static, Result<Box<dyn Any + Send>, BoxError>> + Send + Sync;

/// Alternate operation used when the primary path is unavailable or exhausted.
///
/// The produced value is type-erased at registration and recovered by the
/// caller of `Registry::call`, which names the type it expects.
#[derive(Clone)]
pub struct Fallback {
    produce: Arc<FallbackFn>,
    output: &'static str,
}

impl Fallback {
    pub fn new<F, Fut, T, E>(produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            produce: Arc::new(move || {
                let fut = produce();
                async move {
                    let result: Result<Box<dyn Any + Send>, BoxError> = fut
                        .await
                        .map(|value| Box::new(value) as Box<dyn Any + Send>)
                        .map_err(Into::into);
                    result
                }
                .boxed()
            }),
            output: type_name::<T>(),
        }
    }

    /// A fallback that always yields a clone of `value`.
    pub fn value<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::new(move || {
            let value = value.clone();
            async move { Ok::<_, BoxError>(value) }
        })
    }

    /// Name of the type this fallback produces.
    pub fn output_type(&self) -> &'static str {
        self.output
    }

    pub async fn invoke<T: 'static>(&self) -> Result<T, BoxError> {
        let value = (self.produce)().await?;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            FallbackTypeMismatch {
                expected: type_name::<T>(),
                actual: self.output,
            }
            .into()
        })
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback").field("output", &self.output).finish()
    }
}

/// Immutable policy attached to a dependency at registration.
#[derive(Debug, Clone)]
pub struct DependencyConfig {
    pub health_check: HealthCheck,
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerPolicy,
    pub fallback: Option<Fallback>,
    /// Unhealthy escalates the aggregate to critical; init failure aborts startup.
    pub critical: bool,
    /// Upper bound for any single attempt (and for `initialize`).
    pub timeout: Duration,
}

impl DependencyConfig {
    pub fn from_defaults(defaults: &PolicyDefaults) -> Self {
        Self {
            health_check: HealthCheck::always_healthy(),
            retry: defaults.retry,
            circuit_breaker: defaults.circuit_breaker,
            fallback: None,
            critical: false,
            timeout: Duration::from_millis(defaults.timeout_ms),
        }
    }

    pub fn with_health_check(mut self, check: HealthCheck) -> Self {
        self.health_check = check;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, policy: CircuitBreakerPolicy) -> Self {
        self.circuit_breaker = policy;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self::from_defaults(&PolicyDefaults::default())
    }
}

struct EntryState {
    breaker: CircuitBreaker,
    health: HealthRecord,
}

/// Runtime record for one registered dependency.
///
/// Owned by the registry; the facade and the health monitor hold `Arc`s to it.
pub struct DependencyEntry {
    name: String,
    handle: Arc<dyn ServiceHandle>,
    config: DependencyConfig,
    state: Mutex<EntryState>,
}

impl DependencyEntry {
    pub fn new(name: String, handle: Arc<dyn ServiceHandle>, config: DependencyConfig) -> Self {
        let breaker = CircuitBreaker::new(config.circuit_breaker);
        Self {
            name,
            handle,
            config,
            state: Mutex::new(EntryState {
                breaker,
                health: HealthRecord::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &Arc<dyn ServiceHandle> {
        &self.handle
    }

    pub fn config(&self) -> &DependencyConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the breaker whether a call may proceed.
    pub fn admit(&self) -> Admission {
        let admission = self.lock().breaker.admit();
        if admission == Admission::AllowProbe {
            tracing::info!(dependency = %self.name, "Circuit half-open, admitting probe call");
            metrics::record_breaker_transition(&self.name, BreakerState::HalfOpen);
        }
        admission
    }

    pub fn record_call_success(&self) {
        let transition = self.lock().breaker.record_success();
        if let Some(state) = transition {
            tracing::info!(dependency = %self.name, "Circuit closed, dependency recovered");
            metrics::record_breaker_transition(&self.name, state);
        }
    }

    pub fn record_call_failure(&self) {
        let (transition, failures) = {
            let mut state = self.lock();
            let transition = state.breaker.record_failure();
            (transition, state.breaker.consecutive_failures())
        };
        if let Some(state) = transition {
            tracing::warn!(
                dependency = %self.name,
                consecutive_failures = failures,
                reset_timeout_ms = self.config.circuit_breaker.reset_timeout_ms,
                "Circuit opened"
            );
            metrics::record_breaker_transition(&self.name, state);
        }
    }

    pub fn record_health_success(&self, latency: Duration) {
        let changed = self.lock().health.record_success(latency, SystemTime::now());
        if changed {
            tracing::info!(dependency = %self.name, latency_ms = latency.as_millis() as u64, "Dependency healthy");
        }
        metrics::record_dependency_health(&self.name, true);
    }

    pub fn record_health_failure(&self, error: String) {
        let (changed, failures) = {
            let mut state = self.lock();
            let changed = state.health.record_failure(error.clone(), SystemTime::now());
            (changed, state.health.consecutive_failures)
        };
        if changed {
            tracing::warn!(dependency = %self.name, error = %error, "Dependency unhealthy");
        } else {
            tracing::debug!(dependency = %self.name, consecutive_failures = failures, error = %error, "Health check still failing");
        }
        metrics::record_dependency_health(&self.name, false);
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.lock().breaker.state()
    }

    pub fn consecutive_call_failures(&self) -> u32 {
        self.lock().breaker.consecutive_failures()
    }

    pub fn health_record(&self) -> HealthRecord {
        self.lock().health.clone()
    }

    pub fn health_status(&self) -> HealthStatus {
        self.lock().health.status
    }

    /// Consistent read of breaker and health state under one lock.
    pub fn snapshot(&self) -> DependencyHealth {
        let state = self.lock();
        DependencyHealth {
            status: state.health.status,
            critical: self.config.critical,
            breaker_state: state.breaker.state(),
            consecutive_call_failures: state.breaker.consecutive_failures(),
            consecutive_health_failures: state.health.consecutive_failures,
            last_latency_ms: state.health.last_latency_ms,
            last_error: state.health.last_error.clone(),
            last_check_at: state.health.last_check_at.map(unix_millis),
            last_failure_at: state.breaker.last_failure_wall().map(unix_millis),
        }
    }
}

impl fmt::Debug for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyEntry")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub(crate) type EntryMap = BTreeMap<String, Arc<DependencyEntry>>;
