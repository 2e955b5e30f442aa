//! Field-bus client capability contract

use async_trait::async_trait;

use tagbridge_config::{ConnectionKind, SourceConnection};
use tagbridge_registry::{BusAddress, SourceId};

use crate::error::{FieldBusError, Result};
use crate::sim::SimFieldBus;

/// One controller connection.
///
/// The wire protocol behind this trait is an external collaborator; the
/// engine only needs to open the connection, read addressed values in
/// batches, and close it once at shutdown. Values are normalized to `f64`
/// at this boundary.
#[async_trait]
pub trait FieldBusClient: Send {
    /// Open the connection. Idempotent: opening an open connection is a
    /// no-op for well-behaved clients, but callers check
    /// [`is_connected`](Self::is_connected) first anyway.
    async fn open(&mut self) -> Result<()>;

    /// Whether the connection is currently usable.
    fn is_connected(&self) -> bool;

    /// Read the values behind `addresses` in one protocol exchange.
    ///
    /// Must return exactly one value per address, in address order. Callers
    /// never pass more addresses than the configured batch size.
    async fn read_batch(&mut self, addresses: &[BusAddress]) -> Result<Vec<f64>>;

    /// Close the connection. Called once at process shutdown.
    async fn close(&mut self);
}

/// Builds clients for configured sources.
///
/// The binary decides which backends are linked in; the pool only holds the
/// resulting boxed clients.
pub trait ClientFactory: Send + Sync {
    fn make_client(&self, conn: &SourceConnection) -> Result<Box<dyn FieldBusClient>>;
}

/// Factory for deployments without field-bus hardware: serves `sim` sources
/// with the deterministic simulator and rejects everything else.
#[derive(Debug, Default)]
pub struct SimClientFactory;

impl ClientFactory for SimClientFactory {
    fn make_client(&self, conn: &SourceConnection) -> Result<Box<dyn FieldBusClient>> {
        match conn.kind {
            ConnectionKind::Sim => Ok(Box::new(SimFieldBus::new(&conn.name))),
            kind => Err(FieldBusError::Unsupported {
                source_id: SourceId::new(&conn.name),
                kind,
            }),
        }
    }
}
