//! Stratum relay core.
//!
//! # Data Flow
//! ```text
//! server.rs (accept, admission gate)
//!     → session.rs (upstream connect, teardown)
//!         → pump.rs upstream->client   (framing.rs, Passthrough)
//!         → pump.rs client->upstream   (framing.rs, WorkerRewriter)
//! ```
//!
//! # Design Decisions
//! - Lines are only forwarded once their newline has been read
//! - Only `mining.authorize` is rewritten; other client lines go out as sent
//! - A failure in one session never reaches the listener or other sessions

pub mod error;
pub mod framing;
pub mod pump;
pub mod rewrite;
pub mod server;
pub mod session;

pub use error::{RelayError, RelayResult};
pub use pump::{Direction, PumpExit};
pub use rewrite::{LineHandler, Passthrough, WorkerRewriter, AUTHORIZE_METHOD};
pub use server::RelayServer;
pub use session::{Session, SessionSettings, SessionSummary};
