//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the registry and register one `HttpEndpoint` per configured dependency
//! - Resolve per-dependency policy overrides against the shared defaults
//!
//! `Registry::initialize` is left to the caller so it can decide what a
//! critical failure means for the process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{self, ConfigError, DependencySpec, OrchestratorConfig, PolicyDefaults};
use crate::endpoint::{EndpointError, HttpEndpoint};
use crate::registry::{DependencyConfig, Registry};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("dependency '{name}' has invalid url: {source}")]
    Url {
        name: String,
        #[source]
        source: url::ParseError,
    },

    #[error("dependency '{name}' could not be built: {source}")]
    Endpoint {
        name: String,
        #[source]
        source: EndpointError,
    },
}

/// Load, validate and build in one go. `None` means all defaults.
pub fn load_registry(path: Option<&Path>) -> Result<(OrchestratorConfig, Registry), StartupError> {
    let config = match path {
        Some(path) => config::load_config(path)?,
        None => OrchestratorConfig::default(),
    };
    let registry = build_registry(&config)?;
    Ok((config, registry))
}

/// Build a registry with every configured dependency registered.
pub fn build_registry(config: &OrchestratorConfig) -> Result<Registry, StartupError> {
    let registry = Registry::new(config.monitor.clone());

    for spec in &config.dependencies {
        let url = Url::parse(&spec.url).map_err(|source| StartupError::Url {
            name: spec.name.clone(),
            source,
        })?;

        let policy = resolve_policy(spec, &config.defaults);
        let endpoint = HttpEndpoint::new(&spec.name, url, policy.timeout)
            .map(Arc::new)
            .map_err(|source| StartupError::Endpoint {
                name: spec.name.clone(),
                source,
            })?;

        let policy = policy.with_health_check(endpoint.health_check());
        registry.register(spec.name.clone(), endpoint, policy);
    }

    tracing::info!(dependencies = registry.len(), "Registry built from configuration");
    Ok(registry)
}

/// Shared defaults with the dependency's whole-policy overrides applied.
pub fn resolve_policy(spec: &DependencySpec, defaults: &PolicyDefaults) -> DependencyConfig {
    let mut policy = DependencyConfig::from_defaults(defaults).critical(spec.critical);
    if let Some(retry) = spec.retry {
        policy = policy.with_retry(retry);
    }
    if let Some(breaker) = spec.circuit_breaker {
        policy = policy.with_circuit_breaker(breaker);
    }
    if let Some(timeout_ms) = spec.timeout_ms {
        policy = policy.with_timeout(Duration::from_millis(timeout_ms));
    }
    policy
}
