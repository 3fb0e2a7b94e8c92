//! Error types shared across the orchestration layer.
//!
//! # Taxonomy
//! ```text
//! AttemptError             one attempt failed or timed out
//! CallError                what `Registry::call` surfaces to callers
//! CriticalDependencyError  fatal, only from `Registry::initialize`
//! ```

use std::time::Duration;
use thiserror::Error;

/// Opaque error produced by a wrapped collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a single attempt (call or health check) did not succeed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The operation itself returned an error.
    #[error("operation failed: {0}")]
    Failed(#[source] BoxError),

    /// The attempt did not finish before its deadline.
    #[error("operation timed out after {} ms", .0.as_millis())]
    TimedOut(Duration),
}

impl AttemptError {
    /// Return true if the attempt was cut off by its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::TimedOut(_))
    }
}

/// Errors surfaced by `Registry::call`.
#[derive(Debug, Error)]
pub enum CallError {
    /// No dependency is registered under this name.
    #[error("unknown dependency '{0}'")]
    UnknownDependency(String),

    /// The breaker denied the call and no fallback is configured.
    #[error("circuit open for dependency '{0}'")]
    CircuitOpen(String),

    /// Every attempt failed; carries the cause of the last one.
    #[error("dependency '{name}' failed after {attempts} attempt(s)")]
    OperationFailed {
        name: String,
        attempts: u32,
        #[source]
        cause: AttemptError,
    },

    /// The configured fallback raised. `primary` holds the primary-path error,
    /// or `None` when the breaker denied the call outright.
    #[error("fallback for dependency '{name}' failed")]
    FallbackFailed {
        name: String,
        #[source]
        cause: BoxError,
        primary: Option<AttemptError>,
    },
}

impl CallError {
    /// Name of the dependency the call targeted.
    pub fn dependency(&self) -> &str {
        match self {
            CallError::UnknownDependency(name) | CallError::CircuitOpen(name) => name,
            CallError::OperationFailed { name, .. } | CallError::FallbackFailed { name, .. } => name,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CallError::CircuitOpen(_))
    }

    /// The primary-path error behind a failed fallback, if any.
    pub fn primary_error(&self) -> Option<&AttemptError> {
        match self {
            CallError::FallbackFailed { primary, .. } => primary.as_ref(),
            CallError::OperationFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// One dependency that failed to come up during `initialize()`.
#[derive(Debug)]
pub struct InitFailure {
    pub name: String,
    pub error: AttemptError,
}

/// Raised when at least one critical dependency failed initialization.
#[derive(Debug, Error)]
#[error("critical dependencies failed to initialize: {}", .names.join(", "))]
pub struct CriticalDependencyError {
    names: Vec<String>,
    failures: Vec<InitFailure>,
}

impl CriticalDependencyError {
    pub fn new(mut failures: Vec<InitFailure>) -> Self {
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        let names = failures.iter().map(|f| f.name.clone()).collect();
        Self { names, failures }
    }

    /// Names of the failed critical dependencies, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn failures(&self) -> &[InitFailure] {
        &self.failures
    }
}

/// A fallback produced a value of a different type than the caller expected.
#[derive(Debug, Error)]
#[error("fallback produced {actual}, caller expected {expected}")]
pub struct FallbackTypeMismatch {
    pub expected: &'static str,
    pub actual: &'static str,
}
