//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the configured level
//! - Let `RUST_LOG` override the configured level when present
//! - Report an unrecognised level once logging is live
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Invalid levels are never fatal; they fall back to WARNING

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// Outcome of resolving the configured level name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLevel {
    pub level: LogLevel,
    /// The rejected name, if the configured value was not recognised.
    pub rejected: Option<String>,
}

/// Map a configured level name onto a [`LogLevel`], falling back to the
/// default for unknown names.
pub fn resolve_level(name: &str) -> ResolvedLevel {
    match LogLevel::parse(name) {
        Ok(level) => ResolvedLevel {
            level,
            rejected: None,
        },
        Err(rejected) => ResolvedLevel {
            level: LogLevel::default(),
            rejected: Some(rejected),
        },
    }
}

/// Install the global subscriber.
///
/// Must be called once, before any session starts.
pub fn init(level_name: &str) {
    let resolved = resolve_level(level_name);

    let filter = EnvFilter::builder()
        .with_default_directive(resolved.level.filter().into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(rejected) = resolved.rejected {
        tracing::warn!(
            log_level = %rejected,
            "Invalid log level in config, defaulting to WARNING"
        );
    }
}
