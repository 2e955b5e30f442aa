//! Master store: operations log, users, connection types, sources
//!
//! Seeded once, on first open against an empty `Log` table: a startup
//! log row, a default admin user, and the known connection types. No
//! sources are seeded; they come from the config file or the operator.

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use turso::Database;

use tagbridge_config::{ConnectionKind, SourceConnection};

use crate::error::{Result, StoreError};
use crate::manager::StoreManager;
use crate::schema;

/// One row of the operations log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub category: String,
    pub content: Option<String>,
}

impl StoreManager {
    /// Apply the master schema and seed initial rows on first run.
    pub(crate) async fn init_master(&self) -> Result<()> {
        let conn = self.master().connect()?;

        conn.execute(schema::SCHEMA_LOG, ()).await?;
        conn.execute(schema::SCHEMA_USER, ()).await?;
        conn.execute(schema::SCHEMA_CONNECTION_TYPE, ()).await?;
        conn.execute(schema::SCHEMA_SOURCE, ()).await?;

        let mut rows = conn.query("SELECT COUNT(*) FROM Log", ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        if count == 0 {
            self.seed_master(&conn).await?;
            info!("Master database seeded");
        }

        Ok(())
    }

    async fn seed_master(&self, conn: &turso::Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO Log (Category, Content) VALUES ('System', 'Master store created')",
            (),
        )
        .await?;

        let password = sha256_hex("admin");
        conn.execute(
            "INSERT INTO User (Name, IsAdmin, Password) VALUES ('admin', 1, ?1)",
            [password.as_str()],
        )
        .await?;

        conn.execute("INSERT INTO ConnectionType (Name) VALUES ('S7')", ())
            .await?;
        conn.execute("INSERT INTO ConnectionType (Name) VALUES ('Sim')", ())
            .await?;

        Ok(())
    }

    /// Append a row to the operations log.
    pub async fn insert_log(&self, category: &str, content: &str) -> Result<()> {
        let _gate = self.acquire_write_gate().await?;
        let conn = self.master().connect()?;
        conn.execute(
            "INSERT INTO Log (Category, Content) VALUES (?1, ?2)",
            [category, content],
        )
        .await?;
        Ok(())
    }

    /// The most recent `limit` log rows, newest first.
    pub async fn logs(&self, limit: u32) -> Result<Vec<LogEntry>> {
        let conn = self.master().connect()?;
        let limit = limit.to_string();

        let mut out = Vec::new();
        let mut rows = conn
            .query(
                "SELECT Time, Category, Content FROM Log ORDER BY Id DESC LIMIT ?1",
                [limit.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            out.push(LogEntry {
                time: row
                    .get_value(0)?
                    .as_text()
                    .cloned()
                    .ok_or(StoreError::UnexpectedValue { context: "Log.Time" })?,
                category: row
                    .get_value(1)?
                    .as_text()
                    .cloned()
                    .ok_or(StoreError::UnexpectedValue {
                        context: "Log.Category",
                    })?,
                content: row.get_value(2)?.as_text().cloned(),
            });
        }

        Ok(out)
    }

    /// Insert or update a configured source row, keyed by source name.
    pub async fn upsert_source(&self, conn_cfg: &SourceConnection) -> Result<()> {
        let _gate = self.acquire_write_gate().await?;
        let conn = self.master().connect()?;

        let type_id = connection_type_id(&conn, conn_cfg.kind).await?;
        let cpu_type = conn_cfg.cpu_type.to_string();
        let port = conn_cfg.port.to_string();
        let rack = conn_cfg.rack.to_string();
        let slot = conn_cfg.slot.to_string();
        let comment = conn_cfg.comment.as_deref().unwrap_or("");

        let mut rows = conn
            .query(
                "SELECT Id FROM Source WHERE Name = ?1",
                [conn_cfg.name.as_str()],
            )
            .await?;
        let existing = match rows.next().await? {
            Some(row) => Some(row.get::<i64>(0)?),
            None => None,
        };

        match existing {
            Some(id) => {
                let id = id.to_string();
                conn.execute(
                    "UPDATE Source SET ConnectionType = ?1, CpuType = ?2, Ip = ?3, \
                     Port = ?4, Rack = ?5, Slot = ?6, Comment = ?7 WHERE Id = ?8",
                    [
                        type_id.as_str(),
                        cpu_type.as_str(),
                        conn_cfg.host.as_str(),
                        port.as_str(),
                        rack.as_str(),
                        slot.as_str(),
                        comment,
                        id.as_str(),
                    ],
                )
                .await?;
            }
            None => {
                conn.execute(
                    "INSERT INTO Source \
                     (Name, ConnectionType, CpuType, Ip, Port, Rack, Slot, Comment) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    [
                        conn_cfg.name.as_str(),
                        type_id.as_str(),
                        cpu_type.as_str(),
                        conn_cfg.host.as_str(),
                        port.as_str(),
                        rack.as_str(),
                        slot.as_str(),
                        comment,
                    ],
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Load every configured source, joined to its connection type name.
    ///
    /// Rows whose connection type is unknown to this build are skipped
    /// with a warning rather than failing the load.
    pub async fn load_sources(&self) -> Result<Vec<SourceConnection>> {
        let conn = self.master().connect()?;

        let mut out = Vec::new();
        let mut rows = conn
            .query(
                "SELECT s.Name, ct.Name, s.CpuType, s.Ip, s.Port, s.Rack, s.Slot, s.Comment \
                 FROM Source s JOIN ConnectionType ct ON s.ConnectionType = ct.Id \
                 ORDER BY s.Name",
                (),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let name = row
                .get_value(0)?
                .as_text()
                .cloned()
                .ok_or(StoreError::UnexpectedValue {
                    context: "Source.Name",
                })?;
            let type_name = row
                .get_value(1)?
                .as_text()
                .cloned()
                .ok_or(StoreError::UnexpectedValue {
                    context: "ConnectionType.Name",
                })?;
            let Some(kind) = ConnectionKind::from_type_name(&type_name) else {
                warn!(source = %name, kind = %type_name, "Skipping source with unknown connection type");
                continue;
            };

            out.push(SourceConnection {
                name,
                kind,
                cpu_type: row.get_value(2)?.as_integer().copied().unwrap_or(40),
                host: row.get_value(3)?.as_text().cloned().unwrap_or_default(),
                port: row.get_value(4)?.as_integer().copied().unwrap_or(102) as u16,
                rack: row.get_value(5)?.as_integer().copied().unwrap_or(0) as i16,
                slot: row.get_value(6)?.as_integer().copied().unwrap_or(0) as i16,
                comment: row.get_value(7)?.as_text().cloned().filter(|c| !c.is_empty()),
            });
        }

        Ok(out)
    }
}

/// Id of `kind` in the `ConnectionType` table, as a bind parameter.
async fn connection_type_id(conn: &turso::Connection, kind: ConnectionKind) -> Result<String> {
    let kind_name = kind.to_string();
    let mut rows = conn
        .query(
            "SELECT Id FROM ConnectionType WHERE Name = ?1",
            [kind_name.as_str()],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?.to_string()),
        None => Err(StoreError::MissingConnectionType { kind: kind_name }),
    }
}

/// Hex-encoded SHA-256 of `input`.
pub(crate) fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
