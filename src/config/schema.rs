//! Configuration schema definitions.
//!
//! The relay reads a single flat TOML table. All fields derive Serde traits
//! and fall back to defaults so a minimal file only names the upstream pool
//! and the worker identity.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Host or IP the relay listens on.
    pub listen_host: String,

    /// Port the relay listens on.
    pub listen_port: u16,

    /// Upstream pool host.
    pub upstream_host: String,

    /// Upstream pool port.
    pub upstream_port: u16,

    /// Maximum concurrent sessions (admission gate size).
    pub max_connections: usize,

    /// First half of the replacement worker identity.
    pub workername_modifier: String,

    /// Second half of the replacement worker identity.
    pub workername_override: String,

    /// Log level name (DEBUG, INFO, WARNING, ERROR, CRITICAL).
    pub log_level: String,

    /// Upstream connect timeout in seconds. Zero waits indefinitely.
    pub connect_timeout_secs: u64,

    /// Longest line accepted from either peer, in bytes.
    pub max_line_length: usize,

    /// How long shutdown waits for in-flight sessions, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 3333,
            upstream_host: String::new(),
            upstream_port: 0,
            max_connections: 100,
            workername_modifier: String::new(),
            workername_override: String::new(),
            log_level: "WARNING".to_string(),
            connect_timeout_secs: 10,
            max_line_length: 64 * 1024,
            drain_timeout_secs: 30,
        }
    }
}

impl RelayConfig {
    /// `listen_host:listen_port`, suitable for binding.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// `upstream_host:upstream_port`, suitable for connecting and logging.
    pub fn upstream_address(&self) -> String {
        format!("{}:{}", self.upstream_host, self.upstream_port)
    }

    /// The identity written into `params[0]` of authorize requests.
    pub fn worker_identity(&self) -> String {
        format!("{}.{}", self.workername_modifier, self.workername_override)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }

    /// How long shutdown waits for live sessions. `None` waits until they
    /// have all ended.
    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_timeout_secs > 0).then(|| Duration::from_secs(self.drain_timeout_secs))
    }
}

/// Recognised log level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse a level name, ignoring case.
    ///
    /// Returns the rejected name on failure so the caller can report
    /// it after falling back to [`LogLevel::default`].
    pub fn parse(name: &str) -> Result<Self, String> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(name.to_string()),
        }
    }

    /// The tracing filter for this level. `tracing` has no level above
    /// ERROR, so CRITICAL shares its filter.
    pub fn filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            upstream_host = "pool.example.com"
            upstream_port = 3333
            workername_modifier = "pool"
            workername_override = "rig1"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_address(), "0.0.0.0:3333");
        assert_eq!(config.upstream_address(), "pool.example.com:3333");
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.log_level, "WARNING");
        assert_eq!(config.worker_identity(), "pool.rig1");
    }

    #[test]
    fn zero_connect_timeout_disables_it() {
        let mut config = RelayConfig::default();
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(10)));
        config.connect_timeout_secs = 0;
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn zero_drain_timeout_waits_indefinitely() {
        let mut config = RelayConfig::default();
        assert_eq!(config.drain_timeout(), Some(Duration::from_secs(30)));
        config.drain_timeout_secs = 0;
        assert_eq!(config.drain_timeout(), None);
    }

    #[test]
    fn log_level_names_are_case_insensitive() {
        assert_eq!(LogLevel::parse("debug"), Ok(LogLevel::Debug));
        assert_eq!(LogLevel::parse("Warning"), Ok(LogLevel::Warning));
        assert_eq!(LogLevel::parse("CRITICAL").unwrap().filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::parse("verbose"), Err("verbose".to_string()));
    }
}
