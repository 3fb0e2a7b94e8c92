//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config file.
//! The policy types (`RetryPolicy`, `CircuitBreakerPolicy`) double as the runtime
//! policy attached to each registered dependency.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Periodic health monitor settings.
    pub monitor: MonitorConfig,

    /// Policies applied to dependencies that don't override them.
    pub defaults: PolicyDefaults,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// HTTP-probed dependencies registered at startup.
    pub dependencies: Vec<DependencySpec>,
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Run the periodic health loop after initialization.
    pub enabled: bool,

    /// Interval between health checks of one dependency, in seconds.
    pub interval_secs: u64,

    /// Upper bound for a single health check, in milliseconds.
    pub timeout_ms: u64,

    /// How often the CLI logs the aggregate snapshot, in seconds.
    pub report_interval_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_ms: 5_000,
            report_interval_secs: 60,
        }
    }
}

/// Retry-with-backoff policy.
///
/// `max_retries = 0` means exactly one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay; attempt `n` waits `backoff_base_ms * 2^n`.
    pub backoff_base_ms: u64,

    /// Cap applied to the exponential delay before jitter.
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 100,
            max_backoff_ms: 30_000,
        }
    }
}

/// Circuit breaker policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failed calls that open the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a probe is admitted.
    pub reset_timeout_ms: u64,
}

impl CircuitBreakerPolicy {
    pub fn new(failure_threshold: u32, reset_timeout_ms: u64) -> Self {
        Self {
            failure_threshold,
            reset_timeout_ms,
        }
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 60_000,
        }
    }
}

/// Policies shared by every dependency unless overridden.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyDefaults {
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerPolicy,

    /// Upper bound for a single call attempt, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerPolicy::default(),
            timeout_ms: 30_000,
        }
    }
}

/// A dependency declared in the config file, probed over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencySpec {
    /// Unique dependency name.
    pub name: String,

    /// Endpoint probed by `GET` for initialization and health checks.
    pub url: String,

    /// Escalates aggregate health to critical and aborts startup on init failure.
    #[serde(default)]
    pub critical: bool,

    #[serde(default)]
    pub retry: Option<RetryPolicy>,

    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerPolicy>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
