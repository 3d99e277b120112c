//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, admission gate)
//!     → connection.rs (connection ID, live-session tracking)
//!     → Hand off to relay::session
//! ```
//!
//! # Design Decisions
//! - Accepting never blocks on the gate; sessions wait for a slot instead
//! - Each session tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{AdmissionError, AdmissionGate, ConnectionPermit, ListenerError};
