//! Per-line transforms applied by the pumps.
//!
//! Upstream traffic is opaque and forwarded verbatim. Client traffic must be
//! JSON; `mining.authorize` requests get their worker name replaced, every
//! other message is forwarded as the client sent it.

use std::borrow::Cow;

use serde_json::Value;
use tracing::{debug, info};

use super::error::{RelayError, RelayResult};

/// Stratum method whose first parameter names the worker.
pub const AUTHORIZE_METHOD: &str = "mining.authorize";

/// Turns one complete, non-blank line into the bytes to forward.
///
/// The returned bytes exclude the trailing newline; the pump appends it.
pub trait LineHandler: Send + Sync + 'static {
    fn handle<'a>(&self, line: &'a [u8]) -> RelayResult<Cow<'a, [u8]>>;
}

/// Forwards lines untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl LineHandler for Passthrough {
    fn handle<'a>(&self, line: &'a [u8]) -> RelayResult<Cow<'a, [u8]>> {
        if let Ok(text) = std::str::from_utf8(line) {
            debug!(line = %text.trim(), "Received from upstream");
        }
        Ok(Cow::Borrowed(line))
    }
}

/// Replaces the worker identity in authorize requests.
#[derive(Debug, Clone)]
pub struct WorkerRewriter {
    identity: String,
}

impl WorkerRewriter {
    /// `identity` is written verbatim into `params[0]`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn rewrite_authorize(&self, message: &mut Value) -> RelayResult<Value> {
        let slot = message
            .get_mut("params")
            .and_then(Value::as_array_mut)
            .and_then(|params| params.first_mut())
            .ok_or_else(|| {
                RelayError::MalformedMessage(format!(
                    "{AUTHORIZE_METHOD} without a worker in params"
                ))
            })?;

        Ok(std::mem::replace(slot, Value::String(self.identity.clone())))
    }
}

impl LineHandler for WorkerRewriter {
    fn handle<'a>(&self, line: &'a [u8]) -> RelayResult<Cow<'a, [u8]>> {
        let line = line.trim_ascii();
        let text = std::str::from_utf8(line)
            .map_err(|e| RelayError::MalformedMessage(format!("invalid UTF-8: {e}")))?;

        let mut message: Value = serde_json::from_str(text)
            .map_err(|e| RelayError::MalformedMessage(format!("invalid JSON: {e}")))?;
        if !message.is_object() {
            return Err(RelayError::MalformedMessage(
                "expected a JSON object".to_string(),
            ));
        }

        let method = message.get("method").and_then(Value::as_str);
        if method != Some(AUTHORIZE_METHOD) {
            debug!(line = %text, "Forwarding to upstream");
            return Ok(Cow::Borrowed(line));
        }

        let previous = self.rewrite_authorize(&mut message)?;
        info!(
            worker = %previous,
            identity = %self.identity,
            "Rewrote worker identity"
        );

        let encoded = serde_json::to_vec(&message)
            .map_err(|e| RelayError::MalformedMessage(e.to_string()))?;
        Ok(Cow::Owned(encoded))
    }
}
