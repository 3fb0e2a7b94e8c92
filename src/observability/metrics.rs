//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orchestrator_calls_total` (counter): calls by dependency and outcome
//! - `orchestrator_breaker_transitions_total` (counter): breaker transitions by target state
//! - `orchestrator_dependency_health` (gauge): 1=healthy, 0=unhealthy
//! - `orchestrator_health_check_duration_seconds` (histogram): health check latency

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::resilience::BreakerState;

/// Outcome label for `orchestrator_calls_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    Rejected,
    Fallback,
    FallbackFailed,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure => "failure",
            CallOutcome::Rejected => "rejected",
            CallOutcome::Fallback => "fallback",
            CallOutcome::FallbackFailed => "fallback_failed",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_call(dependency: &str, outcome: CallOutcome) {
    counter!(
        "orchestrator_calls_total",
        "dependency" => dependency.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_breaker_transition(dependency: &str, state: BreakerState) {
    counter!(
        "orchestrator_breaker_transitions_total",
        "dependency" => dependency.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
}

pub fn record_dependency_health(dependency: &str, healthy: bool) {
    gauge!("orchestrator_dependency_health", "dependency" => dependency.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_health_check_duration(dependency: &str, elapsed: Duration) {
    histogram!(
        "orchestrator_health_check_duration_seconds",
        "dependency" => dependency.to_string()
    )
    .record(elapsed.as_secs_f64());
}
