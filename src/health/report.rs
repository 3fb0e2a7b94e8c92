//! Aggregate health reporting.
//!
//! Folds per-dependency health into one overall status:
//! ```text
//! Critical: a critical dependency is Unhealthy
//! Degraded: any dependency is Unhealthy
//! Healthy:  otherwise (Unknown does not degrade)
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::health::state::HealthStatus;
use crate::resilience::BreakerState;

/// Overall status across all dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Critical,
}

/// Point-in-time view of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyHealth {
    pub status: HealthStatus,
    pub critical: bool,
    pub breaker_state: BreakerState,
    /// Consecutive failed calls, as seen by the breaker.
    pub consecutive_call_failures: u32,
    pub consecutive_health_failures: u32,
    pub last_latency_ms: Option<u64>,
    pub last_error: Option<String>,
    /// Unix milliseconds.
    pub last_check_at: Option<u64>,
    /// Unix milliseconds of the failure that last opened the breaker.
    pub last_failure_at: Option<u64>,
}

/// Aggregate health snapshot, ordered by dependency name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub overall: OverallStatus,
    pub dependencies: BTreeMap<String, DependencyHealth>,
}

impl HealthSnapshot {
    pub fn new(dependencies: BTreeMap<String, DependencyHealth>) -> Self {
        let overall = aggregate(dependencies.values());
        Self {
            overall,
            dependencies,
        }
    }

    pub fn unhealthy(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|(_, dep)| dep.status == HealthStatus::Unhealthy)
            .map(|(name, _)| name.as_str())
    }
}

/// Compute the overall status.
pub fn aggregate<'a, I>(dependencies: I) -> OverallStatus
where
    I: IntoIterator<Item = &'a DependencyHealth>,
{
    let mut overall = OverallStatus::Healthy;
    for dep in dependencies {
        if dep.status != HealthStatus::Unhealthy {
            continue;
        }
        if dep.critical {
            return OverallStatus::Critical;
        }
        overall = OverallStatus::Degraded;
    }
    overall
}

pub(crate) fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
