//! Poll cycle configuration

use std::time::Duration;

use serde::Deserialize;

/// Settings for the background poll/sweep cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between poll passes.
    pub interval_secs: u64,

    /// Significance threshold: minimum absolute delta for a reading to
    /// count as changed (strict inequality).
    pub epsilon: f64,

    /// Seconds a tag stays registered without a refresh. Also the sweep
    /// cadence, counted in poll ticks.
    pub ttl_secs: u64,

    /// Maximum addresses per field-bus read exchange. A protocol
    /// constraint, not a correctness knob.
    pub read_batch_size: usize,

    /// Seconds to wait for a connection to open before giving up for this
    /// cycle.
    pub open_timeout_secs: u64,

    /// Tag names registered at startup and kept alive across sweeps.
    pub static_tags: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1,
            epsilon: 0.09,
            ttl_secs: 90,
            read_batch_size: 20,
            open_timeout_secs: 5,
            static_tags: Vec::new(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}
