//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilience_orchestrator::config::MonitorConfig;
use resilience_orchestrator::{BoxError, HealthCheck, ServiceHandle};

/// In-process stand-in for a database or model client.
#[derive(Default)]
pub struct StubService {
    pub fail_init: AtomicBool,
    pub healthy: AtomicBool,
    pub init_calls: AtomicU32,
    pub close_calls: AtomicU32,
    pub health_calls: AtomicU32,
}

impl StubService {
    pub fn up() -> Arc<Self> {
        let stub = Self::default();
        stub.healthy.store(true, Ordering::SeqCst);
        Arc::new(stub)
    }

    pub fn failing_init() -> Arc<Self> {
        let stub = Self::default();
        stub.fail_init.store(true, Ordering::SeqCst);
        Arc::new(stub)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Health check that reads `healthy` on every probe.
    pub fn health_check(self: &Arc<Self>) -> HealthCheck {
        let stub = Arc::clone(self);
        HealthCheck::new(move || {
            stub.health_calls.fetch_add(1, Ordering::SeqCst);
            let healthy = stub.healthy.load(Ordering::SeqCst);
            async move {
                if healthy {
                    Ok(())
                } else {
                    Err("health probe failed")
                }
            }
        })
    }
}

#[async_trait]
impl ServiceHandle for StubService {
    async fn initialize(&self) -> Result<(), BoxError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Monitor settings with a short interval for time-controlled tests.
pub fn monitor(interval_secs: u64) -> MonitorConfig {
    MonitorConfig {
        enabled: true,
        interval_secs,
        timeout_ms: 500,
        report_interval_secs: 60,
    }
}

pub fn disabled_monitor() -> MonitorConfig {
    MonitorConfig {
        enabled: false,
        ..MonitorConfig::default()
    }
}

/// Let spawned tasks run without advancing time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
