//! Store manager: master database plus lazy-loaded day databases
//!
//! # Architecture
//!
//! Two database layers, both Turso:
//! - **Master DB**: singleton for the operations log, users, connection
//!   types, and configured sources
//! - **Day DBs**: per-UTC-day sample partitions (lazy-loaded, cached)
//!
//! Every write funnels through a single async write gate. Acquisition is
//! a bounded try-lock loop; a caller that exhausts its retries gets
//! [`StoreError::WriteBusy`] and its batch is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use turso::{Builder, Database};

use tagbridge_fieldbus::SampleSink;
use tagbridge_registry::Sample;

use crate::error::{Result, StoreError};

/// How many days back a fresh day database looks for a catalog to carry
/// forward.
pub const CATALOG_LOOKBACK_DAYS: i64 = 100;

/// How many times a writer retries the write gate before giving up.
pub const WRITE_RETRY_ATTEMPTS: u32 = 10;

/// Pause between write gate retries.
pub const WRITE_RETRY_DELAY: Duration = Duration::from_millis(150);

/// Manages the master database and per-day sample databases.
///
/// Thread-safe with lazy-loading of day databases.
pub struct StoreManager {
    /// Master database (singleton)
    master: Database,
    /// Day databases keyed by UTC date (lazy-loaded, cached)
    daily: RwLock<HashMap<NaiveDate, Database>>,
    /// Data directory for database files; `None` means in-memory mode
    data_dir: Option<PathBuf>,
    /// Single-writer gate shared by every write path
    pub(crate) write_gate: Mutex<()>,
}

impl StoreManager {
    /// Open a file-based store rooted at `data_dir`.
    ///
    /// Creates the directory if needed, opens `master.db` inside it, and
    /// seeds the master tables on first run.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        std::fs::create_dir_all(&data_dir).map_err(|e| StoreError::Io {
            path: data_dir.display().to_string(),
            source: e,
        })?;

        let master_path = data_dir.join("master.db");
        info!(path = %master_path.display(), "Opening master database");

        let master = Builder::new_local(master_path.to_string_lossy().as_ref())
            .build()
            .await?;

        let manager = Self {
            master,
            daily: RwLock::new(HashMap::new()),
            data_dir: Some(data_dir),
            write_gate: Mutex::new(()),
        };

        manager.init_master().await?;

        Ok(manager)
    }

    /// Open an in-memory store (for testing).
    pub async fn open_memory() -> Result<Self> {
        let master = Builder::new_local(":memory:").build().await?;

        let manager = Self {
            master,
            daily: RwLock::new(HashMap::new()),
            data_dir: None,
            write_gate: Mutex::new(()),
        };

        manager.init_master().await?;

        Ok(manager)
    }

    /// The master database handle.
    pub fn master(&self) -> &Database {
        &self.master
    }

    /// Path of the database file for `day`, or `None` in memory mode.
    pub fn day_path(&self, day: NaiveDate) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(Self::day_file_name(day)))
    }

    pub(crate) fn day_file_name(day: NaiveDate) -> String {
        format!("{}.db", day.format("%Y%m%d"))
    }

    /// Get or create the day database for `day`.
    ///
    /// Lazy-loads on first access and caches the handle. A database
    /// created here gets its schema applied and, when its catalog is
    /// empty, a catalog carried forward from the most recent prior day
    /// within [`CATALOG_LOOKBACK_DAYS`].
    pub async fn day_db(&self, day: NaiveDate) -> Result<Database> {
        // Check cache first (read lock)
        {
            let cache = self.daily.read().await;
            if let Some(db) = cache.get(&day) {
                return Ok(db.clone());
            }
        }

        // Not in cache, create it (write lock)
        let mut cache = self.daily.write().await;

        // Double-check after acquiring write lock
        if let Some(db) = cache.get(&day) {
            return Ok(db.clone());
        }

        let db = match &self.data_dir {
            None => {
                debug!(%day, "Creating in-memory day database");
                Builder::new_local(":memory:").build().await?
            }
            Some(dir) => {
                let path = dir.join(Self::day_file_name(day));
                debug!(%day, path = %path.display(), "Opening day database");
                Builder::new_local(path.to_string_lossy().as_ref())
                    .build()
                    .await?
            }
        };

        crate::day::init_day(&db).await?;
        self.seed_day_catalog(&db, day, &cache).await?;

        cache.insert(day, db.clone());

        Ok(db)
    }

    /// Carry the tag catalog of the most recent prior day forward into a
    /// fresh day database. No-op when the new day already has catalog
    /// rows or when no prior day exists within the lookback window.
    async fn seed_day_catalog(
        &self,
        db: &Database,
        day: NaiveDate,
        cache: &HashMap<NaiveDate, Database>,
    ) -> Result<()> {
        if crate::day::catalog_count(db).await? > 0 {
            return Ok(());
        }

        let Some(prior) = self.find_prior_day(day, cache).await? else {
            debug!(%day, "No prior day database within lookback window");
            return Ok(());
        };

        let entries = crate::day::full_catalog(&prior.1).await?;
        if entries.is_empty() {
            return Ok(());
        }

        let _gate = self.acquire_write_gate().await?;
        crate::day::insert_catalog_entries(db, &entries).await?;
        info!(%day, from = %prior.0, count = entries.len(), "Seeded day catalog");

        Ok(())
    }

    /// Locate the most recent day before `day` that has a database,
    /// scanning back up to the lookback window.
    async fn find_prior_day(
        &self,
        day: NaiveDate,
        cache: &HashMap<NaiveDate, Database>,
    ) -> Result<Option<(NaiveDate, Database)>> {
        for back in 1..=CATALOG_LOOKBACK_DAYS {
            let Some(candidate) = day.checked_sub_days(chrono::Days::new(back as u64)) else {
                break;
            };

            // Cached handle wins in either mode; in memory mode it is the
            // only place a prior day can exist at all.
            if let Some(db) = cache.get(&candidate) {
                return Ok(Some((candidate, db.clone())));
            }

            if let Some(dir) = &self.data_dir {
                let path = dir.join(Self::day_file_name(candidate));
                if path.exists() {
                    let db = Builder::new_local(path.to_string_lossy().as_ref())
                        .build()
                        .await?;
                    return Ok(Some((candidate, db)));
                }
            }
        }

        Ok(None)
    }

    /// Acquire the write gate, retrying with bounded backoff.
    pub(crate) async fn acquire_write_gate(&self) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        for attempt in 1..=WRITE_RETRY_ATTEMPTS {
            if let Ok(guard) = self.write_gate.try_lock() {
                return Ok(guard);
            }
            debug!(attempt, "Write gate busy, retrying");
            tokio::time::sleep(WRITE_RETRY_DELAY).await;
        }

        Err(StoreError::WriteBusy {
            attempts: WRITE_RETRY_ATTEMPTS,
        })
    }

    /// The data directory, when file-backed.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

#[async_trait]
impl SampleSink for StoreManager {
    async fn append(
        &self,
        samples: Vec<Sample>,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if samples.is_empty() {
            return Ok(());
        }

        match self.append_samples(&samples).await {
            Ok(written) => {
                debug!(written, "Appended sample batch");
                Ok(())
            }
            Err(e @ StoreError::WriteBusy { .. }) => {
                warn!(dropped = samples.len(), "Store busy, dropping sample batch");
                Err(Box::new(e))
            }
            Err(e) => Err(Box::new(e)),
        }
    }
}
