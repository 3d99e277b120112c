//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use stratum_relay::config::RelayConfig;
use stratum_relay::lifecycle::Shutdown;
use stratum_relay::net::{AdmissionGate, ConnectionTracker};
use stratum_relay::RelayServer;

pub const WAIT: Duration = Duration::from_secs(2);

/// Line-oriented view of one TCP connection.
pub struct LineConn {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
}

impl LineConn {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer: Some(writer),
        }
    }

    pub async fn connect(addr: SocketAddr) -> Self {
        Self::new(TcpStream::connect(addr).await.unwrap())
    }

    /// Write raw bytes as-is.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let writer = self.writer.as_mut().expect("writer closed");
        writer.write_all(bytes).await.unwrap();
        writer.flush().await.unwrap();
    }

    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\n").as_bytes()).await;
    }

    /// Next line, or `None` on EOF. Panics if nothing arrives in time.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap_or(None)
    }

    /// Half-close our side.
    pub fn close_write(&mut self) {
        self.writer.take();
    }
}

/// A pool stand-in that hands accepted connections to the test.
pub struct MockPool {
    listener: TcpListener,
}

impl MockPool {
    pub async fn start() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.listener.local_addr().unwrap()
    }

    pub async fn accept(&self) -> LineConn {
        let (stream, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("relay never connected to the pool")
            .unwrap();
        LineConn::new(stream)
    }

    /// Accept, but only wait `within`. `None` if nobody connected.
    pub async fn try_accept(&self, within: Duration) -> Option<LineConn> {
        match tokio::time::timeout(within, self.listener.accept()).await {
            Ok(accepted) => Some(LineConn::new(accepted.unwrap().0)),
            Err(_) => None,
        }
    }
}

pub fn config_for(upstream: SocketAddr, max_connections: usize) -> RelayConfig {
    RelayConfig {
        listen_host: "127.0.0.1".into(),
        listen_port: 0,
        upstream_host: upstream.ip().to_string(),
        upstream_port: upstream.port(),
        max_connections,
        workername_modifier: "pool".into(),
        workername_override: "rig1".into(),
        drain_timeout_secs: 5,
        ..RelayConfig::default()
    }
}

/// A relay running in the background.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub gate: AdmissionGate,
    pub tracker: ConnectionTracker,
    pub handle: JoinHandle<std::io::Result<()>>,
}

pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let server = RelayServer::new(config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gate = server.gate().clone();
    let tracker = server.tracker().clone();

    let shutdown = Shutdown::new();
    let token = shutdown.token();
    let handle = tokio::spawn(async move { server.run(listener, token).await });

    RunningRelay {
        addr,
        shutdown,
        gate,
        tracker,
        handle,
    }
}
