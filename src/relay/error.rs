//! Error types for relay sessions.

use std::time::Duration;
use thiserror::Error;

/// Errors that end a single relay session.
///
/// None of these escape the session that produced them; the dispatcher logs
/// them and keeps accepting.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Upstream refused, unreachable, or failed to resolve
    #[error("Failed to connect to upstream {address}: {source}")]
    UpstreamConnect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Upstream did not accept the connection in time
    #[error("Failed to connect to upstream {address}: timed out after {timeout:?}")]
    UpstreamConnectTimeout { address: String, timeout: Duration },

    /// Client line that is not a JSON object, or an authorize request
    /// without a usable `params` array
    #[error("Malformed client message: {0}")]
    MalformedMessage(String),

    /// A peer sent more than the configured limit without a newline
    #[error("Line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },

    /// Transport failure (reset, broken pipe) on either socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pump task panicked or was aborted
    #[error("Pump task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenient Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
