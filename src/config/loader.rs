//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            listen_host = "127.0.0.1"
            listen_port = 4444
            upstream_host = "pool.example.com"
            upstream_port = 3333
            max_connections = 5
            workername_modifier = "pool"
            workername_override = "rig1"
            log_level = "debug"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listen_address(), "127.0.0.1:4444");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = parse_config(r#"upstream_port = "three""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_errors_are_listed() {
        let err = parse_config(r#"upstream_host = "pool.example.com""#).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("`upstream_port`"));
        assert!(message.contains("`workername_modifier` must be set"));
    }

    #[test]
    fn oversized_connection_cap_fails_validation() {
        let err = parse_config(
            r#"
            upstream_host = "pool.example.com"
            upstream_port = 3333
            max_connections = 4611686018427387903
            workername_modifier = "pool"
            workername_override = "rig1"
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::MaxConnections])
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}
