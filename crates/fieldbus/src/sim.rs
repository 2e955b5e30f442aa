//! Deterministic field-bus simulator
//!
//! Stands in for real hardware in demos and integration tests. Each address
//! gets a stable baseline derived from its text plus a slow drift, so
//! successive polls produce occasional significant changes without any
//! randomness.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use tagbridge_registry::BusAddress;

use crate::client::FieldBusClient;
use crate::error::Result;

/// Polls between value steps of one address.
const DRIFT_PERIOD: u64 = 15;

/// Simulated controller connection.
#[derive(Debug)]
pub struct SimFieldBus {
    name: String,
    connected: bool,
    reads: u64,
}

impl SimFieldBus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: false,
            reads: 0,
        }
    }

    fn value_for(&self, address: &BusAddress) -> f64 {
        let mut hasher = DefaultHasher::new();
        address.as_str().hash(&mut hasher);
        let baseline = (hasher.finish() % 1000) as f64 / 10.0;
        let drift = (self.reads / DRIFT_PERIOD % 20) as f64 * 0.5;
        baseline + drift
    }
}

#[async_trait]
impl FieldBusClient for SimFieldBus {
    async fn open(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_batch(&mut self, addresses: &[BusAddress]) -> Result<Vec<f64>> {
        self.reads += 1;
        Ok(addresses.iter().map(|a| self.value_for(a)).collect())
    }

    async fn close(&mut self) {
        self.connected = false;
    }
}

impl std::fmt::Display for SimFieldBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sim:{}", self.name)
    }
}
