//! Tests for master store seeding, logging, and source persistence

use tagbridge_config::{ConnectionKind, SourceConnection};

use crate::StoreManager;

// =============================================================================
// Seeding
// =============================================================================

#[tokio::test]
async fn test_fresh_master_is_seeded() {
    let store = StoreManager::open_memory().await.unwrap();

    let logs = store.logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].category, "System");

    let conn = store.master().connect().unwrap();
    let mut rows = conn
        .query("SELECT IsAdmin, Password FROM User WHERE Name = 'admin'", ())
        .await
        .unwrap();
    let row = rows.next().await.unwrap().expect("admin user seeded");
    assert_eq!(row.get::<i64>(0).unwrap(), 1);
    // Password is stored as a sha256 hex digest, never plaintext.
    let password = row.get_value(1).unwrap().as_text().cloned().unwrap();
    assert_eq!(password.len(), 64);
    assert_ne!(password, "admin");

    let mut rows = conn
        .query("SELECT COUNT(*) FROM ConnectionType", ())
        .await
        .unwrap();
    let row = rows.next().await.unwrap().unwrap();
    assert_eq!(row.get::<i64>(0).unwrap(), 2);

    // No sources are invented at seed time.
    let mut rows = conn.query("SELECT COUNT(*) FROM Source", ()).await.unwrap();
    let row = rows.next().await.unwrap().unwrap();
    assert_eq!(row.get::<i64>(0).unwrap(), 0);
}

#[tokio::test]
async fn test_reopen_does_not_reseed() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = StoreManager::open(dir.path()).await.unwrap();
        store.insert_log("Service", "started").await.unwrap();
    }

    let store = StoreManager::open(dir.path()).await.unwrap();
    let logs = store.logs(10).await.unwrap();
    // One seed row plus the explicit one; reopening added nothing.
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].category, "Service");
}

// =============================================================================
// Operations log
// =============================================================================

#[tokio::test]
async fn test_logs_are_newest_first_and_limited() {
    let store = StoreManager::open_memory().await.unwrap();

    store.insert_log("Service", "started").await.unwrap();
    store.insert_log("Poll", "source A02 unreachable").await.unwrap();
    store.insert_log("Service", "stopping").await.unwrap();

    let logs = store.logs(2).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].content.as_deref(), Some("stopping"));
    assert_eq!(logs[1].content.as_deref(), Some("source A02 unreachable"));
}

// =============================================================================
// Sources
// =============================================================================

#[tokio::test]
async fn test_source_round_trip() {
    let store = StoreManager::open_memory().await.unwrap();

    store
        .upsert_source(&SourceConnection {
            name: "A02".into(),
            kind: ConnectionKind::S7,
            cpu_type: 10,
            host: "192.168.0.5".into(),
            port: 102,
            rack: 0,
            slot: 2,
            comment: Some("line 2 PLC".into()),
        })
        .await
        .unwrap();
    store.upsert_source(&SourceConnection::sim("B01")).await.unwrap();

    let sources = store.load_sources().await.unwrap();
    assert_eq!(sources.len(), 2);

    let a02 = &sources[0];
    assert_eq!(a02.name, "A02");
    assert_eq!(a02.kind, ConnectionKind::S7);
    assert_eq!(a02.cpu_type, 10);
    assert_eq!(a02.host, "192.168.0.5");
    assert_eq!(a02.slot, 2);
    assert_eq!(a02.comment.as_deref(), Some("line 2 PLC"));

    let b01 = &sources[1];
    assert_eq!(b01.name, "B01");
    assert_eq!(b01.kind, ConnectionKind::Sim);
    assert_eq!(b01.comment, None);
}

#[tokio::test]
async fn test_upsert_replaces_existing_source() {
    let store = StoreManager::open_memory().await.unwrap();

    let mut source = SourceConnection {
        name: "A02".into(),
        host: "10.0.0.1".into(),
        ..Default::default()
    };
    store.upsert_source(&source).await.unwrap();

    source.host = "10.0.0.9".into();
    store.upsert_source(&source).await.unwrap();

    let sources = store.load_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].host, "10.0.0.9");
}
