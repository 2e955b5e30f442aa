//! Tagbridge Registry - live tag state shared by the poll loop and viewers
//!
//! The registry is the single piece of state shared between the background
//! poll task, every push session, and every subscription call. It maps tag
//! names to live entries and owns their lifecycle:
//!
//! - **Creation**: a tag is created on first subscription (or static
//!   configuration load) with its source and address parsed from the name.
//! - **Refresh**: re-subscribing an existing tag only bumps its refresh
//!   timestamp; the current value is left alone.
//! - **Eviction**: a periodic sweep removes tags whose last refresh is older
//!   than the TTL (default 90s).
//!
//! # Concurrency
//!
//! Backed by `DashMap`: readers never block readers, and a value update from
//! the poll pass to one entry never blocks access to a different entry.
//! Eviction and refresh of the same key are serialized by the map's shard
//! locking, so a tag refreshed after a sweep started is never dropped by
//! that sweep.

mod registry;
mod tag;

pub use registry::{TagRegistry, DEFAULT_TTL};
pub use tag::{BusAddress, Sample, SourceId, Tag, DEFAULT_SOURCE, SOURCE_PREFIX_LEN};

/// Default significance threshold: the minimum absolute delta between a new
/// reading and a baseline for the reading to count as "changed".
pub const DEFAULT_EPSILON: f64 = 0.09;

/// Strict significance rule shared by the poll pass (registry baseline) and
/// per-viewer diffing (last-sent baseline).
///
/// A new value is significant iff `|next - previous| > epsilon`, or there is
/// no previous value at all. At exactly `epsilon` the change is *not*
/// significant.
pub fn exceeds_threshold(previous: Option<f64>, next: f64, epsilon: f64) -> bool {
    match previous {
        None => true,
        Some(p) => (next - p).abs() > epsilon,
    }
}

#[cfg(test)]
mod registry_test;
