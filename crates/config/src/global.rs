//! Global settings

use serde::Deserialize;

/// Top-level settings that don't belong to one component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Directory holding the master store and the day-partitioned stores.
    pub data_dir: String,

    /// Bind address for the viewer push listener.
    pub listen: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            data_dir: "db".into(),
            listen: "0.0.0.0:9460".into(),
        }
    }
}
