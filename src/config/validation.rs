//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required fields that serde defaults leave empty
//! - Validate value ranges (ports, connection cap, line limit)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - An unknown `log_level` is not an error here; logging falls back instead

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::RelayConfig;

/// Smallest accepted `max_line_length`. Stratum notify lines routinely run
/// to a few hundred bytes.
pub const MIN_LINE_LENGTH: usize = 1024;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{0}` must be set")]
    Missing(&'static str),

    #[error("`upstream_port` must be between 1 and 65535")]
    UpstreamPort,

    #[error("`max_connections` must be between 1 and {max}", max = Semaphore::MAX_PERMITS)]
    MaxConnections,

    #[error("`max_line_length` must be at least {min} bytes, got {0}", min = MIN_LINE_LENGTH)]
    MaxLineLength(usize),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("listen_host", &config.listen_host),
        ("upstream_host", &config.upstream_host),
        ("workername_modifier", &config.workername_modifier),
        ("workername_override", &config.workername_override),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing(name));
        }
    }

    if config.upstream_port == 0 {
        errors.push(ValidationError::UpstreamPort);
    }
    if config.max_connections == 0 || config.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::MaxConnections);
    }
    if config.max_line_length < MIN_LINE_LENGTH {
        errors.push(ValidationError::MaxLineLength(config.max_line_length));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
