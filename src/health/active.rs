//! Periodic health monitoring.
//!
//! # Responsibilities
//! - Run one ticker task per registered dependency
//! - Invoke the dependency's health check under its own timeout
//! - Record status, latency and failure history on the entry
//!
//! Each task only touches its own entry's lock, so monitoring never blocks
//! facade calls to other dependencies. Loops run on the runtime captured by
//! `attach`, so `watch` may be called from threads outside that runtime.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::entry::DependencyEntry;
use crate::resilience::run_with_timeout;

/// Drives per-dependency health check loops.
pub struct HealthMonitor {
    config: MonitorConfig,
    tasks: DashMap<String, JoinHandle<()>>,
    shutdown: Shutdown,
    runtime: Mutex<Option<Handle>>,
}

impl HealthMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            tasks: DashMap::new(),
            shutdown: Shutdown::new(),
            runtime: Mutex::new(None),
        }
    }

    /// Bind future loops to `runtime`.
    pub fn attach(&self, runtime: Handle) {
        *self.runtime.lock().unwrap_or_else(PoisonError::into_inner) = Some(runtime);
    }

    fn runtime(&self) -> Option<Handle> {
        let attached = self.runtime.lock().unwrap_or_else(PoisonError::into_inner).clone();
        attached.or_else(|| Handle::try_current().ok())
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Number of dependencies with a running loop.
    pub fn watched(&self) -> usize {
        self.tasks.len()
    }

    /// Start (or restart) the loop for `entry`.
    ///
    /// With `check_now` the first check runs immediately, otherwise after one interval.
    pub fn watch(&self, entry: Arc<DependencyEntry>, check_now: bool) {
        if !self.config.enabled {
            return;
        }

        let Some(runtime) = self.runtime() else {
            tracing::warn!(dependency = %entry.name(), "No runtime attached, health loop not started");
            return;
        };

        let name = entry.name().to_string();
        let task = runtime.spawn(run_loop(
            entry,
            self.config.interval(),
            self.config.timeout(),
            check_now,
            self.shutdown.subscribe(),
        ));

        if let Some(previous) = self.tasks.insert(name, task) {
            previous.abort();
        }
    }

    /// Stop the loop for `name`. Returns false if none was running.
    pub fn unwatch(&self, name: &str) -> bool {
        match self.tasks.remove(name) {
            Some((_, task)) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Signal every loop to exit and wait for them.
    pub async fn stop(&self) {
        let notified = self.shutdown.trigger();
        tracing::debug!(loops = notified, "Stopping health monitor");

        let names: Vec<String> = self.tasks.iter().map(|t| t.key().clone()).collect();
        for name in names {
            if let Some((_, task)) = self.tasks.remove(&name) {
                if let Err(e) = task.await {
                    if !e.is_cancelled() {
                        tracing::warn!(dependency = %name, error = %e, "Health monitor task ended abnormally");
                    }
                }
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        for task in self.tasks.iter() {
            task.value().abort();
        }
    }
}

async fn run_loop(
    entry: Arc<DependencyEntry>,
    interval: Duration,
    timeout: Duration,
    check_now: bool,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::debug!(
        dependency = %entry.name(),
        interval_secs = interval.as_secs(),
        "Health monitor starting"
    );

    let interval = interval.max(Duration::from_millis(1));
    let start = if check_now { Instant::now() } else { Instant::now() + interval };
    let mut ticker = time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                check_dependency(&entry, timeout).await;
            }
            _ = shutdown.recv() => {
                tracing::debug!(dependency = %entry.name(), "Health monitor received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

/// Run one health check against `entry` and record the result on it.
pub async fn check_dependency(entry: &DependencyEntry, timeout: Duration) -> bool {
    let started = Instant::now();
    let result = run_with_timeout(timeout, entry.config().health_check.invoke()).await;
    let elapsed = started.elapsed();
    metrics::record_health_check_duration(entry.name(), elapsed);

    match result {
        Ok(()) => {
            entry.record_health_success(elapsed);
            true
        }
        Err(e) => {
            entry.record_health_failure(e.to_string());
            false
        }
    }
}
