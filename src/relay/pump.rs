//! Unidirectional line pumps.
//!
//! A [`Pump`] reads raw chunks from one half of a session, frames them into
//! lines, runs each non-blank line through a [`LineHandler`] and writes the
//! result plus `\n` to the other half, flushing after every line. Each
//! suspension point also waits on the session's cancellation token.
//!
//! Cancellation can land inside a write, leaving part of a frame on the
//! wire. The session only cancels a pump while tearing down, and the write
//! half is shut down right after, so the peer sees a truncated last line
//! followed by EOF. That line is not counted as forwarded.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::error::RelayResult;
use super::framing::{is_blank, LineFramer};
use super::rewrite::LineHandler;

/// Read size for pool traffic.
pub const UPSTREAM_CHUNK_SIZE: usize = 8 * 1024;

/// Read size for miner traffic.
pub const CLIENT_CHUNK_SIZE: usize = 4 * 1024;

/// Which way a pump moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    UpstreamToClient,
    ClientToUpstream,
}

impl Direction {
    fn chunk_size(self) -> usize {
        match self {
            Direction::UpstreamToClient => UPSTREAM_CHUNK_SIZE,
            Direction::ClientToUpstream => CLIENT_CHUNK_SIZE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::UpstreamToClient => write!(f, "upstream->client"),
            Direction::ClientToUpstream => write!(f, "client->upstream"),
        }
    }
}

/// How a pump stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The reading side returned EOF.
    PeerClosed,
    /// The session cancelled the pump.
    Cancelled,
}

/// One direction of a relay session.
pub struct Pump<R, W, H> {
    direction: Direction,
    reader: R,
    writer: W,
    handler: H,
    framer: LineFramer,
    chunk_size: usize,
    lines_forwarded: u64,
}

impl<R, W, H> Pump<R, W, H>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    H: LineHandler,
{
    pub fn new(direction: Direction, reader: R, writer: W, handler: H, max_line_length: usize) -> Self {
        Self {
            direction,
            reader,
            writer,
            handler,
            framer: LineFramer::new(max_line_length),
            chunk_size: direction.chunk_size(),
            lines_forwarded: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn lines_forwarded(&self) -> u64 {
        self.lines_forwarded
    }

    /// Give back the reader and writer so the session can close them.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Pump until the reader hits EOF, the token is cancelled, or an error
    /// occurs.
    ///
    /// A trailing line without a newline is still forwarded at EOF.
    pub async fn run(&mut self, cancel: &CancellationToken) -> RelayResult<PumpExit> {
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PumpExit::Cancelled),
                read = self.reader.read(&mut chunk) => read?,
            };

            if n == 0 {
                if let Some(rest) = self.framer.finish() {
                    if !self.forward(&rest, cancel).await? {
                        return Ok(PumpExit::Cancelled);
                    }
                }
                return Ok(PumpExit::PeerClosed);
            }

            self.framer.extend(&chunk[..n]);
            while let Some(line) = self.framer.next_line()? {
                if !self.forward(&line, cancel).await? {
                    return Ok(PumpExit::Cancelled);
                }
            }
        }
    }

    /// Write one line to the other side. Returns `false` if cancelled before
    /// the frame was fully written and flushed.
    async fn forward(&mut self, line: &[u8], cancel: &CancellationToken) -> RelayResult<bool> {
        if is_blank(line) {
            return Ok(true);
        }

        let out = self.handler.handle(line)?;
        let mut frame = Vec::with_capacity(out.len() + 1);
        frame.extend_from_slice(&out);
        frame.push(b'\n');

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = write_frame(&mut self.writer, &frame) => Some(res),
        };

        match written {
            None => Ok(false),
            Some(res) => {
                res?;
                self.lines_forwarded += 1;
                Ok(true)
            }
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}
