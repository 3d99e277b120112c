//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → log → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Triggered → listener stops accepting → sessions drain → Exit
//! ```
//!
//! # Design Decisions
//! - Shutdown stops accepting; it does not kill live sessions
//! - Draining has a deadline: the process exits after it regardless

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
