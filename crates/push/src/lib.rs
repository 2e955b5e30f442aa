//! Tagbridge Push - change-only streaming to viewers
//!
//! A viewer opens a connection, sends one subscription message (a JSON
//! array of tag names), and from then on receives only deltas: on each
//! cadence tick the session compares current registry values against what
//! this viewer last saw and sends the tags that moved by more than the
//! significance threshold. An unchanged plant produces no traffic.
//!
//! # Architecture
//!
//! ```text
//! Transport (one per viewer)
//!     |  subscription: ["A02_DB10_DBW2", ...]
//!     v
//! PushSession -- registers names --> TagRegistry
//!     |  cadence tick
//!     v
//! ChangeDetector (per-viewer baselines)
//!     |  non-empty diff
//!     v
//! Transport <- [{"N":"A02_DB10_DBW2","V":10.2,"T":"..."}]
//! ```
//!
//! The transport is a trait so sessions run the same over a TCP line
//! protocol in production and a scripted double in tests.

mod detector;
mod error;
mod protocol;
mod session;
mod transport;

pub use detector::ChangeDetector;
pub use error::{PushError, Result};
pub use protocol::{encode_deltas, parse_subscription, TagDelta};
pub use session::{PushSession, SessionConfig, SessionState, DEFAULT_CADENCE};
pub use transport::Transport;

#[cfg(test)]
mod detector_test;
