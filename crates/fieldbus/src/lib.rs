//! Tagbridge Fieldbus - source connections and the background poll cycle
//!
//! This crate owns everything between the registry and the wire:
//!
//! - [`FieldBusClient`] - the opaque capability contract for one controller
//!   connection (open / is_connected / read_batch / close). The wire
//!   protocol itself is an external collaborator.
//! - [`SourcePool`] - configured connections with lazy open, bounded open
//!   timeouts, reconnect-on-demand, and order-preserving batch splitting.
//! - [`PollScheduler`] - the single background cycle: a periodic tick
//!   drives parallel per-source poll passes over the registry, applies the
//!   significance rule, hands changed samples to a [`SampleSink`], and
//!   periodically sweeps expired tags.
//!
//! # Failure isolation
//!
//! A poll failure on one source (connection or protocol error) is logged
//! and isolated: other sources proceed, the scheduler keeps running, and
//! the failed source's tags simply keep their stale values until the next
//! cycle reopens the connection.

mod client;
mod error;
mod pool;
mod scheduler;
mod sim;

pub use client::{ClientFactory, FieldBusClient, SimClientFactory};
pub use error::{FieldBusError, Result};
pub use pool::{SourcePool, OPEN_TIMEOUT, READ_BATCH_SIZE};
pub use scheduler::{PollScheduler, PollerConfig, SampleSink};
pub use sim::SimFieldBus;

#[cfg(test)]
mod pool_test;
