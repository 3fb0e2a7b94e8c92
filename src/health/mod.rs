//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Per-dependency timer
//!     → Invoke the dependency's health check under timeout
//!     → Update state.rs on the entry
//!
//! State (state.rs):
//!     Unknown → Healthy ←→ Unhealthy
//!
//! Reporting (report.rs):
//!     Entry snapshots → OverallStatus (healthy / degraded / critical)
//! ```
//!
//! # Design Decisions
//! - Health is independent of the circuit breaker; neither drives the other
//! - A single result flips the status, no flap thresholds
//! - Health state is per-dependency, stored on the registry entry

pub mod active;
pub mod report;
pub mod state;

pub use active::HealthMonitor;
pub use report::{DependencyHealth, HealthSnapshot, OverallStatus};
pub use state::{HealthRecord, HealthStatus};
