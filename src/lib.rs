//! Resilience orchestration for external dependencies.
//!
//! Wraps named collaborators (databases, model providers, HTTP APIs) with a
//! circuit breaker, retry with backoff, per-attempt timeouts, optional fallbacks
//! and periodic health checks, and reports one aggregate health status.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::OrchestratorConfig;
pub use error::{AttemptError, BoxError, CallError, CriticalDependencyError};
pub use health::{HealthSnapshot, HealthStatus, OverallStatus};
pub use lifecycle::Shutdown;
pub use registry::{CallOutput, DependencyConfig, Fallback, HealthCheck, Registry, ServiceHandle};
pub use resilience::BreakerState;
