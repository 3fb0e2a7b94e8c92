//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::OrchestratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<OrchestratorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<OrchestratorConfig, ConfigError> {
    let config: OrchestratorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid() {
        let config = parse_config("").unwrap();
        assert!(config.dependencies.is_empty());
        assert_eq!(config.monitor.timeout_ms, 5_000);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [monitor]
            interval_secs = 10

            [defaults.retry]
            max_retries = 2
            backoff_base_ms = 50

            [[dependencies]]
            name = "openai"
            url = "https://api.openai.com/v1/models"

            [[dependencies]]
            name = "store"
            url = "http://127.0.0.1:8000/health"
            critical = true
            timeout_ms = 2000
            circuit_breaker = { failure_threshold = 2, reset_timeout_ms = 1000 }
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.interval_secs, 10);
        assert_eq!(config.defaults.retry.max_retries, 2);
        assert_eq!(config.dependencies.len(), 2);

        let store = &config.dependencies[1];
        assert!(store.critical);
        assert_eq!(store.timeout_ms, Some(2000));
        assert_eq!(store.circuit_breaker.map(|p| p.failure_threshold), Some(2));
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = parse_config(
            r#"
            [monitor]
            interval_secs = 0
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("monitor = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
