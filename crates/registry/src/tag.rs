//! Tag model and name parsing
//!
//! A tag name like `A02_DB10_DBW2` encodes everything the bridge needs: the
//! first three characters name the owning controller (`A02`), and the
//! remainder after the separator, with `_` swapped for `.`, is the address
//! on that controller (`DB10.DBW2`).
//!
//! Parsing is a pure function of the name. Malformed names degrade to the
//! default source and an empty address instead of failing; such tags are
//! simply never polled.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Number of leading characters of a tag name that identify its source.
pub const SOURCE_PREFIX_LEN: usize = 3;

/// Source id assigned to names too short to carry a prefix.
pub const DEFAULT_SOURCE: &str = "A00";

/// Identifier of a controller, derived from a tag name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id from an explicit name (configuration path).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the owning source from a tag name.
    pub fn from_tag_name(name: &str) -> Self {
        match name.get(..SOURCE_PREFIX_LEN) {
            Some(prefix) => Self(prefix.to_string()),
            None => Self(DEFAULT_SOURCE.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of one value on a controller, e.g. `DB10.DBW2`.
///
/// Together with [`SourceId`] this is the value-equality key that maps read
/// results back to tags. The wire-level meaning of the address is the
/// field-bus client's business; the registry only carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BusAddress(String);

impl BusAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Derive the address from the remainder of a tag name.
    ///
    /// Everything after the prefix and its separator, with the in-name `_`
    /// separator substituted by the on-bus `.` separator. Names without a
    /// remainder yield an empty address.
    pub fn from_tag_name(name: &str) -> Self {
        match name.get(SOURCE_PREFIX_LEN + 1..) {
            Some(rest) if !rest.is_empty() => Self(rest.replace('_', ".")),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live registry entry for one named process value.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Unique tag name, e.g. `A02_DB10_DBW2`.
    pub name: String,
    /// Owning controller, parsed from the name prefix.
    pub source: SourceId,
    /// Address on the controller, parsed from the name remainder.
    pub address: BusAddress,
    /// Last significant value read from the controller, if any.
    pub value: Option<f64>,
    /// Optional operator comment carried into the day catalog.
    pub comment: Option<String>,
    /// Whether changed samples of this tag are persisted.
    pub logged: bool,
    /// Last time the tag was (re-)subscribed; drives TTL eviction.
    pub last_refresh: Instant,
    /// Registration order, used for deterministic per-source batching.
    pub(crate) seq: u64,
}

impl Tag {
    /// Build a fresh entry from a tag name alone.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SourceId::from_tag_name(name),
            address: BusAddress::from_tag_name(name),
            value: None,
            comment: None,
            logged: true,
            last_refresh: Instant::now(),
            seq: 0,
        }
    }
}

/// One changed reading queued for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub name: String,
    pub value: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, name: impl Into<String>, value: f64) -> Self {
        Self {
            time,
            name: name.into(),
            value,
        }
    }

    /// A sample stamped with the current UTC time.
    pub fn now(name: impl Into<String>, value: f64) -> Self {
        Self::new(Utc::now(), name, value)
    }
}
