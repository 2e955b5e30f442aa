//! Configuration validation
//!
//! Catches obvious misconfiguration at startup instead of at poll time:
//! source names that can never match a tag prefix, missing hosts, and
//! nonsensical thresholds or intervals.

use tagbridge_registry::SOURCE_PREFIX_LEN;

use crate::error::{ConfigError, Result};
use crate::sources::ConnectionKind;
use crate::Config;

impl Config {
    /// Validate the configuration.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (name, source) in &self.sources {
            if name.len() != SOURCE_PREFIX_LEN {
                return Err(ConfigError::invalid_value(
                    "source",
                    name,
                    "name",
                    format!("must be exactly {SOURCE_PREFIX_LEN} characters to match tag prefixes"),
                ));
            }
            if source.kind == ConnectionKind::S7 && source.host.is_empty() {
                return Err(ConfigError::missing_field("source", name, "host"));
            }
        }

        if !(self.poll.epsilon > 0.0) {
            return Err(ConfigError::invalid_value(
                "poll",
                "poll",
                "epsilon",
                "must be positive",
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "poll",
                "poll",
                "interval_secs",
                "must be at least 1",
            ));
        }
        if self.poll.ttl_secs == 0 {
            return Err(ConfigError::invalid_value(
                "poll",
                "poll",
                "ttl_secs",
                "must be at least 1",
            ));
        }
        if self.poll.read_batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "poll",
                "poll",
                "read_batch_size",
                "must be at least 1",
            ));
        }
        if self.push.cadence_secs == 0 {
            return Err(ConfigError::invalid_value(
                "push",
                "push",
                "cadence_secs",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
