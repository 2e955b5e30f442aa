//! Per-viewer change detection
//!
//! Each viewer carries its own baseline map: the value this viewer last
//! received for each subscribed tag. A tag is emitted when it has a
//! current value and either the viewer never saw one or the difference
//! from the last-sent value exceeds the threshold. Baselines update only
//! on emit, so a viewer that missed a send sees the change on the next
//! tick instead of never.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use tagbridge_registry::exceeds_threshold;

use crate::protocol::TagDelta;

/// Tracks what one viewer has seen and computes the next delta batch.
pub struct ChangeDetector {
    requested: Vec<String>,
    last_sent: HashMap<String, f64>,
    epsilon: f64,
}

impl ChangeDetector {
    pub fn new(requested: Vec<String>, epsilon: f64) -> Self {
        Self {
            requested,
            last_sent: HashMap::new(),
            epsilon,
        }
    }

    /// The tag names this viewer asked for, in subscription order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Compute the deltas to send, given a lookup of current values. All
    /// deltas of one batch carry the same `now` timestamp.
    ///
    /// Tags without a current value (never polled, or expired) are
    /// skipped without touching their baseline.
    pub fn diff(
        &mut self,
        lookup: impl Fn(&str) -> Option<f64>,
        now: DateTime<Utc>,
    ) -> Vec<TagDelta> {
        let mut deltas = Vec::new();
        for name in &self.requested {
            let Some(current) = lookup(name) else {
                continue;
            };
            let previous = self.last_sent.get(name.as_str()).copied();
            if exceeds_threshold(previous, current, self.epsilon) {
                self.last_sent.insert(name.clone(), current);
                deltas.push(TagDelta::new(name.clone(), current, now));
            }
        }
        deltas
    }
}
