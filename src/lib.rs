//! Stratum worker-rewriting relay.
//!
//! Sits between a mining client and an upstream pool, forwarding
//! newline-delimited JSON both ways and replacing the worker name in
//! `mining.authorize` requests.
//!
//! ```text
//!   miner ──▶ net::listener ──▶ relay::session ──┬─ client->upstream (rewrite) ──▶ pool
//!                                                └─ upstream->client (verbatim) ◀── pool
//! ```

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use lifecycle::Shutdown;
pub use relay::RelayServer;
