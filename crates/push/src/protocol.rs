//! Wire protocol: subscription parsing and delta encoding
//!
//! Inbound, a viewer sends exactly one message: a JSON array of tag
//! names. Outbound, the session sends JSON arrays of compact delta
//! objects, `{"N": name, "V": value, "T": timestamp}`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{PushError, Result};

/// One changed tag as sent to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDelta {
    /// Tag name
    #[serde(rename = "N")]
    pub name: String,
    /// Current value
    #[serde(rename = "V")]
    pub value: f64,
    /// When this delta batch was computed
    #[serde(rename = "T")]
    pub time: DateTime<Utc>,
}

impl TagDelta {
    pub fn new(name: impl Into<String>, value: f64, time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value,
            time,
        }
    }
}

/// Parse a subscription message into a list of tag names.
///
/// Blank entries are dropped and duplicates collapse to their first
/// occurrence, preserving order. A subscription that names nothing is
/// rejected.
pub fn parse_subscription(message: &str) -> Result<Vec<String>> {
    let raw: Vec<String> =
        serde_json::from_str(message).map_err(PushError::BadSubscription)?;

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n == trimmed) {
            names.push(trimmed.to_string());
        }
    }

    if names.is_empty() {
        return Err(PushError::EmptySubscription);
    }
    Ok(names)
}

/// Encode a batch of deltas as one outbound message.
pub fn encode_deltas(deltas: &[TagDelta]) -> Result<String> {
    Ok(serde_json::to_string(deltas)?)
}
