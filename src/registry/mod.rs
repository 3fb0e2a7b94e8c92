//! Service registry.
//!
//! # Data Flow
//! ```text
//! register(name, handle, config)
//!     → entry.rs (DependencyEntry, breaker + health state)
//!     → copy-on-write swap of the entry map
//!
//! initialize()
//!     → every entry concurrently: handle.initialize() under timeout
//!       → one immediate health check
//!     → settle all, then evaluate critical failures
//!     → health::active starts one loop per entry
//!
//! call(name, operation)    (facade.rs)
//! health_status()          (health::report)
//! ```
//!
//! # Design Decisions
//! - The entry map is read on every call and written rarely, so it lives behind
//!   an `ArcSwap` and is replaced wholesale on register/unregister
//! - Each entry has its own lock; there is no registry-wide lock on the call path
//! - Map writes and monitor start/stop are serialized by `membership`, so an
//!   entry registered while `initialize()` runs is still watched, and a stale
//!   replaced entry never is
//! - Re-registering a name replaces the entry; there is no versioning

pub mod entry;
pub mod facade;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;

use crate::config::MonitorConfig;
use crate::error::{CriticalDependencyError, InitFailure};
use crate::health::active::{check_dependency, HealthMonitor};
use crate::health::report::HealthSnapshot;
use crate::resilience::run_with_timeout;

pub use entry::{DependencyConfig, DependencyEntry, Fallback, HealthCheck, ServiceHandle};
pub use facade::CallOutput;

use entry::EntryMap;

/// Holds one entry per named dependency and drives their lifecycle.
pub struct Registry {
    entries: ArcSwap<EntryMap>,
    monitor: HealthMonitor,
    monitoring: AtomicBool,
    membership: Mutex<()>,
}

impl Registry {
    pub fn new(monitor: MonitorConfig) -> Self {
        Self {
            entries: ArcSwap::from_pointee(EntryMap::new()),
            monitor: HealthMonitor::new(monitor),
            monitoring: AtomicBool::new(false),
            membership: Mutex::new(()),
        }
    }

    fn membership(&self) -> MutexGuard<'_, ()> {
        self.membership.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handle` under `name`, replacing any existing entry.
    ///
    /// If monitoring is already running, the entry's health loop starts right away.
    /// Safe to call from threads outside the runtime.
    pub fn register<S>(&self, name: impl Into<String>, handle: Arc<S>, config: DependencyConfig)
    where
        S: ServiceHandle,
    {
        let name = name.into();
        let entry = Arc::new(DependencyEntry::new(name.clone(), handle, config));

        let _membership = self.membership();
        let previous = self.entries.rcu(|current| {
            let mut next = EntryMap::clone(current);
            next.insert(name.clone(), entry.clone());
            next
        });

        if previous.contains_key(&name) {
            tracing::info!(dependency = %name, "Dependency re-registered, replacing entry");
        } else {
            tracing::info!(dependency = %name, critical = entry.config().critical, "Dependency registered");
        }

        if self.monitoring.load(Ordering::SeqCst) {
            self.monitor.watch(entry, true);
        }
    }

    /// Remove `name`, stop its health loop and close its handle.
    ///
    /// Returns false if nothing was registered under that name.
    pub async fn unregister(&self, name: &str) -> bool {
        let entry = {
            let _membership = self.membership();
            let previous = self.entries.rcu(|current| {
                let mut next = EntryMap::clone(current);
                next.remove(name);
                next
            });
            let Some(entry) = previous.get(name).cloned() else {
                return false;
            };
            self.monitor.unwatch(name);
            entry
        };

        close_entry(&entry).await;
        tracing::info!(dependency = %name, "Dependency unregistered");
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<DependencyEntry>> {
        self.entries.load().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.load().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Initialize every dependency concurrently, then start health monitoring.
    ///
    /// All initializations settle before the outcome is decided. Only failures of
    /// critical dependencies fail the whole call; non-critical ones are recorded as
    /// unhealthy and keep being probed by the monitor.
    pub async fn initialize(&self) -> Result<(), CriticalDependencyError> {
        let entries: Vec<Arc<DependencyEntry>> = self.entries.load().values().cloned().collect();
        let check_timeout = self.monitor.config().timeout();

        tracing::info!(dependencies = entries.len(), "Initializing dependencies");

        let outcomes = join_all(entries.iter().map(|entry| async move {
            let outcome = run_with_timeout(entry.config().timeout, entry.handle().initialize()).await;
            match &outcome {
                Ok(()) => {
                    check_dependency(entry, check_timeout).await;
                }
                Err(e) => {
                    tracing::warn!(
                        dependency = %entry.name(),
                        critical = entry.config().critical,
                        error = %e,
                        "Dependency failed to initialize"
                    );
                    entry.record_health_failure(format!("initialization failed: {e}"));
                }
            }
            outcome
        }))
        .await;

        let failures: Vec<InitFailure> = entries
            .iter()
            .zip(outcomes)
            .filter_map(|(entry, outcome)| match outcome {
                Err(error) if entry.config().critical => Some(InitFailure {
                    name: entry.name().to_string(),
                    error,
                }),
                _ => None,
            })
            .collect();

        if !failures.is_empty() {
            let err = CriticalDependencyError::new(failures);
            tracing::error!(error = %err, "Initialization aborted");
            return Err(err);
        }

        self.start_monitoring(&entries);
        tracing::info!(overall = ?self.health_status().overall, "Dependencies initialized");
        Ok(())
    }

    /// Watch every entry currently registered.
    ///
    /// `initialized` are the entries just checked by `initialize()`; anything
    /// registered or replaced since then gets its first check immediately.
    fn start_monitoring(&self, initialized: &[Arc<DependencyEntry>]) {
        if !self.monitor.config().enabled {
            tracing::info!("Periodic health checks disabled");
            return;
        }

        let _membership = self.membership();
        if self.monitoring.swap(true, Ordering::SeqCst) {
            return;
        }
        self.monitor.attach(Handle::current());

        let current = self.entries.load_full();
        tracing::info!(
            interval_secs = self.monitor.config().interval_secs,
            dependencies = current.len(),
            "Health monitor starting"
        );
        for entry in current.values() {
            let checked = initialized.iter().any(|e| Arc::ptr_eq(e, entry));
            self.monitor.watch(entry.clone(), !checked);
        }
    }

    /// Aggregate health across all dependencies. Pure read.
    pub fn health_status(&self) -> HealthSnapshot {
        let dependencies: BTreeMap<_, _> = self
            .entries
            .load()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.snapshot()))
            .collect();
        HealthSnapshot::new(dependencies)
    }

    /// Stop monitoring, close every handle (best-effort) and clear the registry.
    pub async fn shutdown(&self) {
        {
            let _membership = self.membership();
            self.monitoring.store(false, Ordering::SeqCst);
        }
        self.monitor.stop().await;

        let entries = self.entries.swap(Arc::new(EntryMap::new()));
        join_all(entries.values().map(|entry| close_entry(entry))).await;

        tracing::info!(closed = entries.len(), "Registry shut down");
    }
}

async fn close_entry(entry: &DependencyEntry) {
    if let Err(e) = run_with_timeout(entry.config().timeout, entry.handle().close()).await {
        tracing::warn!(dependency = %entry.name(), error = %e, "Failed to close dependency");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::HealthStatus;

    struct Noop;
    impl ServiceHandle for Noop {}

    #[test]
    fn test_register_and_replace() {
        let registry = Registry::default();
        registry.register("db", Arc::new(Noop), DependencyConfig::default());
        registry.register("llm", Arc::new(Noop), DependencyConfig::default());
        assert_eq!(registry.names(), vec!["db".to_string(), "llm".to_string()]);

        registry.register("db", Arc::new(Noop), DependencyConfig::default().critical(true));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("db").unwrap().config().critical);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = Registry::default();
        registry.register("db", Arc::new(Noop), DependencyConfig::default());

        assert!(registry.unregister("db").await);
        assert!(!registry.unregister("db").await);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_empty_registry() {
        let registry = Registry::default();
        assert!(registry.initialize().await.is_ok());
        assert!(registry.is_monitoring());
        registry.shutdown().await;
        assert!(!registry.is_monitoring());
    }

    #[tokio::test]
    async fn test_initialize_runs_first_health_check() {
        let mut monitor = MonitorConfig::default();
        monitor.enabled = false;
        let registry = Registry::new(monitor);
        registry.register("db", Arc::new(Noop), DependencyConfig::default());

        registry.initialize().await.unwrap();

        assert!(!registry.is_monitoring());
        let db = registry.get("db").unwrap();
        assert_eq!(db.health_status(), HealthStatus::Healthy);
        assert!(db.health_record().last_latency_ms.is_some());
    }
}
