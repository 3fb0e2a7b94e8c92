//! Configuration validation.
//!
//! Validation is a pure function: `&OrchestratorConfig → Result<(), Vec<ValidationError>>`.
//! It returns every violation, not just the first.

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::{CircuitBreakerPolicy, OrchestratorConfig, RetryPolicy};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("monitor interval must be greater than zero")]
    ZeroMonitorInterval,

    #[error("{scope}: timeout must be greater than zero")]
    ZeroTimeout { scope: String },

    #[error("{scope}: failure_threshold must be greater than zero")]
    ZeroFailureThreshold { scope: String },

    #[error("{scope}: reset_timeout_ms must be greater than zero")]
    ZeroResetTimeout { scope: String },

    #[error("{scope}: backoff_base_ms must be greater than zero")]
    ZeroBackoffBase { scope: String },

    #[error("{scope}: max_backoff_ms ({max}) is below backoff_base_ms ({base})")]
    BackoffCapBelowBase { scope: String, base: u64, max: u64 },

    #[error("dependency name must not be empty")]
    EmptyName,

    #[error("dependency '{0}' is declared more than once")]
    DuplicateDependency(String),

    #[error("dependency '{name}': invalid url '{url}': {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.monitor.interval_secs == 0 {
        errors.push(ValidationError::ZeroMonitorInterval);
    }
    if config.monitor.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { scope: "monitor".into() });
    }

    check_timeout("defaults", config.defaults.timeout_ms, &mut errors);
    check_retry("defaults", &config.defaults.retry, &mut errors);
    check_breaker("defaults", &config.defaults.circuit_breaker, &mut errors);

    let mut seen = HashSet::new();
    for dep in &config.dependencies {
        if dep.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        } else if !seen.insert(dep.name.as_str()) {
            errors.push(ValidationError::DuplicateDependency(dep.name.clone()));
        }

        let scope = format!("dependency '{}'", dep.name);
        if let Some(timeout_ms) = dep.timeout_ms {
            check_timeout(&scope, timeout_ms, &mut errors);
        }
        if let Some(retry) = &dep.retry {
            check_retry(&scope, retry, &mut errors);
        }
        if let Some(breaker) = &dep.circuit_breaker {
            check_breaker(&scope, breaker, &mut errors);
        }

        match Url::parse(&dep.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidUrl {
                name: dep.name.clone(),
                url: dep.url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                name: dep.name.clone(),
                url: dep.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_timeout(scope: &str, timeout_ms: u64, errors: &mut Vec<ValidationError>) {
    if timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { scope: scope.to_string() });
    }
}

fn check_retry(scope: &str, policy: &RetryPolicy, errors: &mut Vec<ValidationError>) {
    if policy.backoff_base_ms == 0 {
        errors.push(ValidationError::ZeroBackoffBase { scope: scope.to_string() });
    }
    if policy.max_backoff_ms < policy.backoff_base_ms {
        errors.push(ValidationError::BackoffCapBelowBase {
            scope: scope.to_string(),
            base: policy.backoff_base_ms,
            max: policy.max_backoff_ms,
        });
    }
}

fn check_breaker(scope: &str, policy: &CircuitBreakerPolicy, errors: &mut Vec<ValidationError>) {
    if policy.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold { scope: scope.to_string() });
    }
    if policy.reset_timeout_ms == 0 {
        errors.push(ValidationError::ZeroResetTimeout { scope: scope.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DependencySpec;

    fn spec(name: &str, url: &str) -> DependencySpec {
        DependencySpec {
            name: name.to_string(),
            url: url.to_string(),
            critical: false,
            retry: None,
            circuit_breaker: None,
            timeout_ms: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = OrchestratorConfig::default();
        config.defaults.circuit_breaker.failure_threshold = 0;
        config.defaults.retry.backoff_base_ms = 0;
        config.dependencies.push(spec("db", "http://127.0.0.1:5432/health"));
        config.dependencies.push(spec("db", "ftp://example.com"));
        config.dependencies.push(spec("", "not a url"));

        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::ZeroFailureThreshold { scope: "defaults".into() }));
        assert!(errors.contains(&ValidationError::ZeroBackoffBase { scope: "defaults".into() }));
        assert!(errors.contains(&ValidationError::DuplicateDependency("db".into())));
        assert!(errors.contains(&ValidationError::EmptyName));
        let bad_urls = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidUrl { .. }))
            .count();
        assert_eq!(bad_urls, 2);
    }

    #[test]
    fn test_override_checked() {
        let mut config = OrchestratorConfig::default();
        let mut dep = spec("llm", "https://api.example.com");
        dep.retry = Some(RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 500,
            max_backoff_ms: 100,
        });
        dep.timeout_ms = Some(0);
        config.dependencies.push(dep);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::ZeroTimeout { .. }));
        assert!(matches!(errors[1], ValidationError::BackoffCapBelowBase { base: 500, max: 100, .. }));
    }
}
