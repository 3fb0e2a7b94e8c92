//! Dependency health record.
//!
//! # States
//! - Unknown: never checked
//! - Healthy: last check succeeded
//! - Unhealthy: last check (or initialization) failed
//!
//! No hysteresis: a single result flips the status. The consecutive failure
//! count is kept so dashboards can tell a blip from an outage.

use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Health status of one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

/// Result history of health checks for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub last_check_at: Option<SystemTime>,
    pub consecutive_failures: u32,
    pub last_latency_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl HealthRecord {
    /// Record a successful check. Returns true if the status changed.
    pub fn record_success(&mut self, latency: Duration, at: SystemTime) -> bool {
        let changed = self.status != HealthStatus::Healthy;
        *self = HealthRecord {
            status: HealthStatus::Healthy,
            last_check_at: Some(at),
            consecutive_failures: 0,
            last_latency_ms: Some(latency.as_millis() as u64),
            last_error: None,
        };
        changed
    }

    /// Record a failed check. Returns true if the status changed.
    ///
    /// `last_latency_ms` keeps the latency of the last successful check.
    pub fn record_failure(&mut self, error: String, at: SystemTime) -> bool {
        let changed = self.status != HealthStatus::Unhealthy;
        self.status = HealthStatus::Unhealthy;
        self.last_check_at = Some(at);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
        changed
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_then_success() {
        let mut record = HealthRecord::default();
        assert_eq!(record.status, HealthStatus::Unknown);

        let now = SystemTime::now();
        assert!(record.record_failure("refused".into(), now));
        assert!(!record.record_failure("refused again".into(), now));
        assert_eq!(record.consecutive_failures, 2);
        assert_eq!(record.last_error.as_deref(), Some("refused again"));
        assert!(record.is_unhealthy());

        assert!(record.record_success(Duration::from_millis(12), now));
        assert_eq!(
            record,
            HealthRecord {
                status: HealthStatus::Healthy,
                last_check_at: Some(now),
                consecutive_failures: 0,
                last_latency_ms: Some(12),
                last_error: None,
            }
        );
    }

    #[test]
    fn test_failure_keeps_previous_latency() {
        let mut record = HealthRecord::default();
        let now = SystemTime::now();
        record.record_success(Duration::from_millis(40), now);
        record.record_failure("timeout".into(), now);

        assert_eq!(record.last_latency_ms, Some(40));
        assert_eq!(record.consecutive_failures, 1);
    }
}
