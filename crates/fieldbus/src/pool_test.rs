//! Tests for the source pool: lazy open, reconnect, batch splitting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tagbridge_config::SourceConnection;
use tagbridge_registry::{BusAddress, SourceId};

use crate::error::{FieldBusError, Result};
use crate::{FieldBusClient, SourcePool};

// =============================================================================
// Test client
// =============================================================================

#[derive(Default)]
struct ClientState {
    connected: bool,
    open_calls: u32,
    fail_open: bool,
    batch_sizes: Vec<usize>,
    seen_addresses: Vec<String>,
    /// Extra values appended per read (to provoke count mismatches)
    surplus: usize,
}

struct RecordingClient {
    state: Arc<Mutex<ClientState>>,
}

impl RecordingClient {
    fn new() -> (Self, Arc<Mutex<ClientState>>) {
        let state = Arc::new(Mutex::new(ClientState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

#[async_trait]
impl FieldBusClient for RecordingClient {
    async fn open(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.open_calls += 1;
        if state.fail_open {
            return Err(FieldBusError::Open {
                source_id: SourceId::new("A02"),
                message: "connection refused".into(),
            });
        }
        state.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    async fn read_batch(&mut self, addresses: &[BusAddress]) -> Result<Vec<f64>> {
        let mut state = self.state.lock().unwrap();
        state.batch_sizes.push(addresses.len());
        state
            .seen_addresses
            .extend(addresses.iter().map(|a| a.as_str().to_string()));
        Ok(vec![1.0; addresses.len() + state.surplus])
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().connected = false;
    }
}

/// Client whose open never completes.
struct StuckClient;

#[async_trait]
impl FieldBusClient for StuckClient {
    async fn open(&mut self) -> Result<()> {
        std::future::pending().await
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn read_batch(&mut self, _addresses: &[BusAddress]) -> Result<Vec<f64>> {
        Ok(Vec::new())
    }

    async fn close(&mut self) {}
}

fn pool_with(name: &str, client: Box<dyn FieldBusClient>) -> SourcePool {
    let mut pool = SourcePool::new();
    pool.add_source(SourceConnection::sim(name), client);
    pool
}

fn items(count: usize) -> Vec<(String, BusAddress)> {
    (0..count)
        .map(|i| {
            let name = format!("A02_DB10_DBW{i}");
            let address = BusAddress::from_tag_name(&name);
            (name, address)
        })
        .collect()
}

// =============================================================================
// Batch splitting
// =============================================================================

#[tokio::test]
async fn test_45_items_split_into_20_20_5() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));

    let items = items(45);
    let readings = pool
        .read_all(&SourceId::new("A02"), &items)
        .await
        .unwrap();

    assert_eq!(state.lock().unwrap().batch_sizes, [20, 20, 5]);
    assert_eq!(readings.len(), 45);

    // Order is preserved end to end: batches in registration order,
    // readings matched back to names in the same order.
    let expected: Vec<String> = items.iter().map(|(_, a)| a.as_str().to_string()).collect();
    assert_eq!(state.lock().unwrap().seen_addresses, expected);
    assert_eq!(readings[0].0, "A02_DB10_DBW0");
    assert_eq!(readings[44].0, "A02_DB10_DBW44");
}

#[tokio::test]
async fn test_small_list_is_a_single_batch() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));

    pool.read_all(&SourceId::new("A02"), &items(3)).await.unwrap();
    assert_eq!(state.lock().unwrap().batch_sizes, [3]);
}

// =============================================================================
// Open / reconnect
// =============================================================================

#[tokio::test]
async fn test_connection_opened_lazily_and_reused() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));
    let source = SourceId::new("A02");

    pool.read_all(&source, &items(1)).await.unwrap();
    pool.read_all(&source, &items(1)).await.unwrap();

    assert_eq!(state.lock().unwrap().open_calls, 1);
}

#[tokio::test]
async fn test_reopens_when_connection_reports_closed() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));
    let source = SourceId::new("A02");

    pool.read_all(&source, &items(1)).await.unwrap();
    state.lock().unwrap().connected = false;
    pool.read_all(&source, &items(1)).await.unwrap();

    assert_eq!(state.lock().unwrap().open_calls, 2);
}

#[tokio::test]
async fn test_open_failure_surfaces_as_error() {
    let (client, state) = RecordingClient::new();
    state.lock().unwrap().fail_open = true;
    let pool = pool_with("A02", Box::new(client));

    let err = pool
        .read_all(&SourceId::new("A02"), &items(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FieldBusError::Open { .. }));
}

#[tokio::test]
async fn test_open_attempt_is_bounded() {
    let mut pool = SourcePool::with_limits(Duration::from_millis(50), 20);
    pool.add_source(SourceConnection::sim("A02"), Box::new(StuckClient));

    let err = pool.ensure_open(&SourceId::new("A02")).await.unwrap_err();
    assert!(matches!(err, FieldBusError::OpenTimeout { .. }));
}

#[tokio::test]
async fn test_ensure_open_is_idempotent() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));
    let source = SourceId::new("A02");

    pool.ensure_open(&source).await.unwrap();
    pool.ensure_open(&source).await.unwrap();
    assert_eq!(state.lock().unwrap().open_calls, 1);
}

// =============================================================================
// Errors and shutdown
// =============================================================================

#[tokio::test]
async fn test_unknown_source() {
    let pool = SourcePool::new();
    let err = pool.ensure_open(&SourceId::new("Z99")).await.unwrap_err();
    assert!(matches!(err, FieldBusError::UnknownSource { .. }));
}

#[tokio::test]
async fn test_value_count_mismatch_is_a_protocol_error() {
    let (client, state) = RecordingClient::new();
    state.lock().unwrap().surplus = 1;
    let pool = pool_with("A02", Box::new(client));

    let err = pool
        .read_all(&SourceId::new("A02"), &items(2))
        .await
        .unwrap_err();
    assert!(matches!(err, FieldBusError::Protocol { .. }));
}

#[tokio::test]
async fn test_close_all_closes_open_connections() {
    let (client, state) = RecordingClient::new();
    let pool = pool_with("A02", Box::new(client));

    pool.ensure_open(&SourceId::new("A02")).await.unwrap();
    pool.close_all().await;
    assert!(!state.lock().unwrap().connected);
}
