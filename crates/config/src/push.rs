//! Viewer push configuration

use std::time::Duration;

use serde::Deserialize;

/// Settings for viewer-facing delta streaming.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Seconds between per-viewer diff passes.
    pub cadence_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { cadence_secs: 1 }
    }
}

impl PushConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }
}
