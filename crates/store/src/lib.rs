//! Tagbridge Store - day-partitioned sample persistence
//!
//! Uses Turso (async SQLite-compatible) for two kinds of stores:
//!
//! - **Master store** (`master.db`): long-lived. Holds the operations log,
//!   users, connection types, and configured sources.
//! - **Day stores** (`YYYYMMDD.db`, UTC): append-only sample partitions,
//!   lazy-created on first reference to their day. A fresh day's tag
//!   catalog is carried forward from the most recent non-empty prior day
//!   within a bounded lookback window.
//!
//! # Write serialization
//!
//! The underlying store permits one writer at a time, so all writes funnel
//! through a single async write gate. Acquisition retries with bounded
//! backoff; when the gate stays busy the batch is dropped and logged rather
//! than stalling the poll loop. Reads don't touch the gate.

mod day;
mod error;
mod manager;
mod master;
mod schema;

pub use day::CatalogEntry;
pub use error::{Result, StoreError};
pub use manager::{
    StoreManager, CATALOG_LOOKBACK_DAYS, WRITE_RETRY_ATTEMPTS, WRITE_RETRY_DELAY,
};
pub use master::LogEntry;

#[cfg(test)]
mod master_test;
