//! Collector module
//!
//! This module groups all logic responsible for:
//! - Opening one streaming connection per batch
//! - Keeping each batch alive across connection failures
//! - Forwarding raw updates to the sink
//!
//! Layers, bottom-up:
//! - transport:  connection traits + tokio-tungstenite implementation
//! - lease:      at-most-one-connection-per-batch bookkeeping
//! - worker:     one connection, one batch, one read loop
//! - supervisor: cool-down and restart loop around a worker
//! - runner:     discovery, partitioning, one supervisor per batch
//!
//! Design notes:
//! - Exchange-specific logic MUST NOT live here
//! - Batches share nothing mutable except the sink and the
//!   cancellation token

pub mod lease;
pub mod runner;
pub mod supervisor;
pub mod transport;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;
