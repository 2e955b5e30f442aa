//! Tagbridge Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use tagbridge_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sources.A02]\nkind = \"sim\"").unwrap();
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [sources.A02]
//! host = "10.0.11.60"
//!
//! [poll]
//! static_tags = ["A02_DB10_DBW2"]
//! ```
//!
//! See `configs/tagbridge.toml` for all available options.

mod error;
mod global;
mod logging;
mod poll;
mod push;
mod sources;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::LogConfig;
pub use poll::PollConfig;
pub use push::PushConfig;
pub use sources::{ConnectionKind, SourceConnection};

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (data directory, listener address)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Poll cycle settings (interval, threshold, TTL, batching)
    pub poll: PollConfig,

    /// Viewer push settings
    pub push: PushConfig,

    /// Configured controllers, keyed by the three-character source prefix
    pub sources: BTreeMap<String, SourceConnection>,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = raw.parse::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// The configured sources with their map keys applied as names
    /// (the `ConfigStore.listSources()` contract).
    pub fn list_sources(&self) -> Vec<SourceConnection> {
        self.sources
            .iter()
            .map(|(name, source)| {
                let mut source = source.clone();
                source.name = name.clone();
                source
            })
            .collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
