//! One relayed client connection.
//!
//! # Lifecycle
//! ```text
//! accepted client + permit
//!     → connect upstream (fail: close client, drop permit, done)
//!     → spawn upstream->client and client->upstream pumps
//!     → first pump finishes (EOF, error)
//!     → cancel sibling, await it
//!     → shut down upstream, then client write halves
//!     → drop sockets and permit
//! ```
//!
//! Teardown runs once, from `run`, whichever pump finished first.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::error::{RelayError, RelayResult};
use super::pump::{Direction, Pump, PumpExit};
use super::rewrite::{LineHandler, Passthrough, WorkerRewriter};
use crate::config::RelayConfig;
use crate::net::{ConnectionId, ConnectionPermit};

/// Read-only settings shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub upstream_address: String,
    pub connect_timeout: Option<Duration>,
    pub max_line_length: usize,
    pub rewriter: WorkerRewriter,
}

impl SessionSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            upstream_address: config.upstream_address(),
            connect_timeout: config.connect_timeout(),
            max_line_length: config.max_line_length,
            rewriter: WorkerRewriter::new(config.worker_identity()),
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// The pump that finished first and triggered teardown.
    pub ended_by: Direction,
    pub exit: PumpExit,
    pub lines_to_upstream: u64,
    pub lines_to_client: u64,
}

/// Everything a pump task hands back when it stops.
struct PumpOutcome {
    direction: Direction,
    result: RelayResult<PumpExit>,
    lines: u64,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

/// A client connection waiting to be relayed.
pub struct Session {
    id: ConnectionId,
    client: TcpStream,
    peer: SocketAddr,
    settings: Arc<SessionSettings>,
    permit: ConnectionPermit,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        client: TcpStream,
        peer: SocketAddr,
        settings: Arc<SessionSettings>,
        permit: ConnectionPermit,
    ) -> Self {
        Self {
            id,
            client,
            peer,
            settings,
            permit,
        }
    }

    /// Relay until either side closes or fails.
    ///
    /// The admission permit is held until this returns. All events, including
    /// those from the pump tasks, carry the connection ID.
    pub async fn run(self) -> RelayResult<SessionSummary> {
        let span = info_span!("session", connection_id = %self.id);
        self.relay().instrument(span).await
    }

    async fn relay(self) -> RelayResult<SessionSummary> {
        let Session {
            id: _,
            mut client,
            peer,
            settings,
            permit,
        } = self;

        let upstream = match connect_upstream(&settings).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    upstream = %settings.upstream_address,
                    error = %e,
                    "Failed to connect to upstream"
                );
                let _ = client.shutdown().await;
                drop(permit);
                return Err(e);
            }
        };

        info!(
            peer = %peer,
            upstream = %settings.upstream_address,
            "Connected to upstream"
        );

        client.set_nodelay(true).ok();
        upstream.set_nodelay(true).ok();

        let (client_reader, client_writer) = client.into_split();
        let (upstream_reader, upstream_writer) = upstream.into_split();
        let cancel = CancellationToken::new();

        let mut to_client = spawn_pump(
            Pump::new(
                Direction::UpstreamToClient,
                upstream_reader,
                client_writer,
                Passthrough,
                settings.max_line_length,
            ),
            cancel.clone(),
        );
        let mut to_upstream = spawn_pump(
            Pump::new(
                Direction::ClientToUpstream,
                client_reader,
                upstream_writer,
                settings.rewriter.clone(),
                settings.max_line_length,
            ),
            cancel.clone(),
        );

        let (ended_by, first, sibling) = tokio::select! {
            done = &mut to_upstream => (Direction::ClientToUpstream, done, to_client),
            done = &mut to_client => (Direction::UpstreamToClient, done, to_upstream),
        };

        cancel.cancel();
        let second = sibling.await;

        let result = teardown(ended_by, [first, second]).await;
        drop(permit);

        match &result {
            Ok(summary) => info!(
                ended_by = %summary.ended_by,
                lines_to_upstream = summary.lines_to_upstream,
                lines_to_client = summary.lines_to_client,
                "Session closed"
            ),
            Err(e) => warn!(error = %e, "Session terminated"),
        }

        result
    }
}

async fn connect_upstream(settings: &SessionSettings) -> RelayResult<TcpStream> {
    let address = settings.upstream_address.as_str();
    let connect = TcpStream::connect(address);

    let result = match settings.connect_timeout {
        Some(timeout) => tokio::time::timeout(timeout, connect).await.map_err(|_| {
            RelayError::UpstreamConnectTimeout {
                address: address.to_string(),
                timeout,
            }
        })?,
        None => connect.await,
    };

    result.map_err(|source| RelayError::UpstreamConnect {
        address: address.to_string(),
        source,
    })
}

fn spawn_pump<H: LineHandler>(
    mut pump: Pump<OwnedReadHalf, OwnedWriteHalf, H>,
    cancel: CancellationToken,
) -> JoinHandle<PumpOutcome> {
    tokio::spawn(
        async move {
            let result = pump.run(&cancel).await;
            let direction = pump.direction();
            let lines = pump.lines_forwarded();
            let (reader, writer) = pump.into_parts();
            PumpOutcome {
                direction,
                result,
                lines,
                reader,
                writer,
            }
        }
        .in_current_span(),
    )
}

/// Close both sockets and fold the pump outcomes into one result.
///
/// `joined` is in completion order, so the first error reported is the one
/// that ended the session. Upstream is shut down before the client.
async fn teardown(
    ended_by: Direction,
    joined: [Result<PumpOutcome, JoinError>; 2],
) -> RelayResult<SessionSummary> {
    let mut failure = None;
    let mut outcomes = Vec::with_capacity(2);
    for result in joined {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                failure.get_or_insert(RelayError::Join(e));
            }
        }
    }

    for direction in [Direction::ClientToUpstream, Direction::UpstreamToClient] {
        if let Some(outcome) = outcomes.iter_mut().find(|o| o.direction == direction) {
            if let Err(e) = outcome.writer.shutdown().await {
                debug!(direction = %direction, error = %e, "Write half already closed");
            }
        }
    }

    let mut summary = SessionSummary {
        ended_by,
        exit: PumpExit::PeerClosed,
        lines_to_upstream: 0,
        lines_to_client: 0,
    };

    for outcome in outcomes {
        match outcome.direction {
            Direction::ClientToUpstream => summary.lines_to_upstream = outcome.lines,
            Direction::UpstreamToClient => summary.lines_to_client = outcome.lines,
        }
        match outcome.result {
            Ok(exit) if outcome.direction == ended_by => summary.exit = exit,
            Ok(_) => {}
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
        drop((outcome.reader, outcome.writer));
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}
