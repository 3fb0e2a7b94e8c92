//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → OrchestratorConfig (validated, immutable)
//!     → lifecycle::startup builds the Registry from it
//! ```
//!
//! # Design Decisions
//! - Every field has a default so an empty file is a valid config
//! - Per-dependency policy overrides replace the defaults per policy, not per field
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CircuitBreakerPolicy, DependencySpec, MonitorConfig, ObservabilityConfig, OrchestratorConfig,
    PolicyDefaults, RetryPolicy,
};
pub use validation::{validate_config, ValidationError};
