//! TCP listener binding and the session admission gate.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Enforce max_connections via semaphore
//!
//! The gate is acquired per session after the connection is accepted, so a
//! full gate delays session start without stopping the accept loop.

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Error returned when the gate can no longer hand out permits.
#[derive(Debug, Error)]
#[error("Admission gate closed")]
pub struct AdmissionError;

/// Bind a TCP listener on `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let address = format!("{host}:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::debug!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}

/// Counting semaphore bounding concurrent sessions.
///
/// Waiters are served in FIFO order. When the limit is reached, new
/// sessions wait until a slot becomes available; they are never rejected.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    max_sessions: usize,
}

impl AdmissionGate {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }

    /// Wait for a free slot.
    ///
    /// The returned permit must be held for the session's lifetime.
    pub async fn acquire(&self) -> Result<ConnectionPermit, AdmissionError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AdmissionError)?;

        tracing::trace!(available_permits = self.available(), "Session admitted");

        Ok(ConnectionPermit { _permit: permit })
    }

    /// Get current available session slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get configured maximum sessions.
    pub fn max(&self) -> usize {
        self.max_sessions
    }
}

/// A permit representing a session slot.
///
/// When dropped, the slot is released back to the gate.
/// This ensures the cap holds even if the session panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
