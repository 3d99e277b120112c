//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured log events via `tracing` macros
//!     → connection IDs attached as fields for correlation
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//! ```

pub mod logging;
