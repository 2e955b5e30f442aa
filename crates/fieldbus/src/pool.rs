//! Source pool - configured controller connections
//!
//! Holds one slot per physical controller. Connections are opened lazily
//! before first use and re-opened on demand when a client reports closed.
//! Each slot is guarded by its own async mutex, so batches within one
//! source stay strictly sequential (the protocol requires per-connection
//! ordering) while different sources poll in parallel.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use tagbridge_config::SourceConnection;
use tagbridge_registry::{BusAddress, SourceId};

use crate::client::FieldBusClient;
use crate::error::{FieldBusError, Result};

/// Maximum addresses per protocol exchange.
pub const READ_BATCH_SIZE: usize = 20;

/// Bound on a single connection-open attempt.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

struct SourceSlot {
    conn: SourceConnection,
    client: Mutex<Box<dyn FieldBusClient>>,
}

/// Configured controller connections with batch-splitting reads.
pub struct SourcePool {
    slots: HashMap<SourceId, SourceSlot>,
    open_timeout: Duration,
    batch_size: usize,
}

impl SourcePool {
    pub fn new() -> Self {
        Self::with_limits(OPEN_TIMEOUT, READ_BATCH_SIZE)
    }

    pub fn with_limits(open_timeout: Duration, batch_size: usize) -> Self {
        Self {
            slots: HashMap::new(),
            open_timeout,
            batch_size,
        }
    }

    /// Register a controller and its client. Called once per source at
    /// startup; the connection is not opened here.
    pub fn add_source(&mut self, conn: SourceConnection, client: Box<dyn FieldBusClient>) {
        let id = SourceId::new(&conn.name);
        debug!(source = %id, kind = %conn.kind, "added source");
        self.slots.insert(
            id,
            SourceSlot {
                conn,
                client: Mutex::new(client),
            },
        );
    }

    /// Ids of all configured sources, in stable order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.slots.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Connection parameters of one source.
    pub fn connection(&self, source: &SourceId) -> Option<&SourceConnection> {
        self.slots.get(source).map(|slot| &slot.conn)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Open the connection for `source` if it isn't open already.
    ///
    /// The attempt is bounded by the pool's open timeout so one unreachable
    /// controller can't stall a poll cycle; the next cycle retries.
    pub async fn ensure_open(&self, source: &SourceId) -> Result<()> {
        let slot = self.slot(source)?;
        let mut client = slot.client.lock().await;
        self.open_locked(source, &mut client).await
    }

    /// Read every addressed item of one source.
    ///
    /// Splits `items` into chunks of at most the batch size and reads them
    /// sequentially over the slot's connection, preserving item order.
    /// Returns `(tag name, value)` pairs.
    pub async fn read_all(
        &self,
        source: &SourceId,
        items: &[(String, BusAddress)],
    ) -> Result<Vec<(String, f64)>> {
        let slot = self.slot(source)?;
        let mut client = slot.client.lock().await;
        self.open_locked(source, &mut client).await?;

        let mut readings = Vec::with_capacity(items.len());
        for chunk in items.chunks(self.batch_size) {
            let addresses: Vec<BusAddress> =
                chunk.iter().map(|(_, address)| address.clone()).collect();
            let values = client.read_batch(&addresses).await?;
            if values.len() != addresses.len() {
                return Err(FieldBusError::Protocol {
                    source_id: source.clone(),
                    message: format!(
                        "read {} values for {} addresses",
                        values.len(),
                        addresses.len()
                    ),
                });
            }
            for ((name, _), value) in chunk.iter().zip(values) {
                readings.push((name.clone(), value));
            }
        }
        Ok(readings)
    }

    /// Close every connection. Called once at process shutdown.
    pub async fn close_all(&self) {
        for (id, slot) in &self.slots {
            let mut client = slot.client.lock().await;
            if client.is_connected() {
                client.close().await;
                info!(source = %id, "closed source connection");
            }
        }
    }

    fn slot(&self, source: &SourceId) -> Result<&SourceSlot> {
        self.slots
            .get(source)
            .ok_or_else(|| FieldBusError::UnknownSource {
                source_id: source.clone(),
            })
    }

    async fn open_locked(
        &self,
        source: &SourceId,
        client: &mut Box<dyn FieldBusClient>,
    ) -> Result<()> {
        if client.is_connected() {
            return Ok(());
        }
        match timeout(self.open_timeout, client.open()).await {
            Ok(result) => {
                if result.is_ok() {
                    info!(source = %source, "opened source connection");
                }
                result
            }
            Err(_) => Err(FieldBusError::OpenTimeout {
                source_id: source.clone(),
                timeout: self.open_timeout,
            }),
        }
    }
}

impl Default for SourcePool {
    fn default() -> Self {
        Self::new()
    }
}
