//! Accept loop and session dispatch.
//!
//! # Responsibilities
//! - Accept client connections until shutdown is requested
//! - Spawn one session task per connection, gated by the admission gate
//! - On shutdown, stop listening and give in-flight sessions time to finish

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::{Session, SessionSettings};
use crate::config::RelayConfig;
use crate::net::listener::{self, ListenerError};
use crate::net::{AdmissionGate, ConnectionTracker};

/// Pause after a failed accept (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The relay: one listener feeding sessions to one upstream.
pub struct RelayServer {
    config: Arc<RelayConfig>,
    settings: Arc<SessionSettings>,
    gate: AdmissionGate,
    tracker: ConnectionTracker,
}

impl RelayServer {
    /// Create a server from a validated configuration.
    pub fn new(config: RelayConfig) -> Self {
        let settings = Arc::new(SessionSettings::from_config(&config));
        let gate = AdmissionGate::new(config.max_connections);

        Self {
            config: Arc::new(config),
            settings,
            gate,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener, ListenerError> {
        listener::bind(&self.config.listen_host, self.config.listen_port).await
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Shutdown stops accepting and closes the listener, then waits up to
    /// `drain_timeout_secs` for live sessions, or until they all end when it
    /// is 0. Sessions are not killed; any still running when the wait ends
    /// are left to the process exit.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!(
            address = %addr,
            upstream = %self.settings.upstream_address,
            max_connections = self.gate.max(),
            "Listening"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        info!(
            active_sessions = self.tracker.active_count(),
            "Shutting down server"
        );

        match self.config.drain_timeout() {
            Some(deadline) => {
                if tokio::time::timeout(deadline, self.tracker.wait_idle()).await.is_err() {
                    warn!(
                        active_sessions = self.tracker.active_count(),
                        "Drain timeout elapsed with sessions still open"
                    );
                }
            }
            None => self.tracker.wait_idle().await,
        }

        info!("Server stopped");
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        let guard = self.tracker.track();
        let gate = self.gate.clone();
        let settings = Arc::clone(&self.settings);

        debug!(
            connection_id = %guard.id(),
            peer = %peer,
            available_permits = gate.available(),
            "Connection accepted"
        );

        tokio::spawn(async move {
            let permit = match gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(connection_id = %guard.id(), error = %e, "Dropping connection");
                    return;
                }
            };

            // The session logs its own outcome.
            let _ = Session::new(guard.id(), stream, peer, settings, permit)
                .run()
                .await;
            drop(guard);
        });
    }
}
