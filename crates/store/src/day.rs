//! Day database operations: sample appends and tag catalog access
//!
//! Each UTC day owns one database with two tables: `TagCatalog` (the tag
//! names seen so far, carried forward day to day) and `Sample` (the
//! change-only value history). Only significant changes reach `Sample`,
//! so an unchanged plant writes nothing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;
use turso::Database;

use tagbridge_registry::Sample;

use crate::error::{Result, StoreError};
use crate::manager::StoreManager;
use crate::schema;

/// One row of a day's tag catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub tag_type: Option<String>,
    pub comment: Option<String>,
}

/// Apply the day schema.
pub(crate) async fn init_day(db: &Database) -> Result<()> {
    let conn = db.connect()?;
    conn.execute(schema::SCHEMA_TAG_CATALOG, ()).await?;
    conn.execute(schema::SCHEMA_SAMPLE, ()).await?;
    debug!("Day database schema initialized");
    Ok(())
}

/// Number of rows in the day's tag catalog.
pub(crate) async fn catalog_count(db: &Database) -> Result<i64> {
    let conn = db.connect()?;
    let mut rows = conn
        .query("SELECT COUNT(*) FROM TagCatalog", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

/// The day's catalog, including names that only ever appeared in `Sample`.
///
/// A tag that was sampled but never cataloged (a store written by an
/// older build, or a partial write) still carries forward. The merge
/// happens here rather than in SQL; missing `TagType` and `TagComment`
/// come back as `None`, whether stored as NULL or ''.
pub(crate) async fn full_catalog(db: &Database) -> Result<Vec<CatalogEntry>> {
    let conn = db.connect()?;

    let mut entries = Vec::new();
    let mut rows = conn
        .query(
            "SELECT TagName, TagType, TagComment FROM TagCatalog ORDER BY TagName",
            (),
        )
        .await?;
    while let Some(row) = rows.next().await? {
        entries.push(CatalogEntry {
            name: row
                .get_value(0)?
                .as_text()
                .cloned()
                .ok_or(StoreError::UnexpectedValue {
                    context: "TagCatalog.TagName",
                })?,
            tag_type: row.get_value(1)?.as_text().cloned().filter(|s| !s.is_empty()),
            comment: row.get_value(2)?.as_text().cloned().filter(|s| !s.is_empty()),
        });
    }

    let cataloged = entries.len();
    let mut rows = conn
        .query("SELECT DISTINCT TagName FROM Sample ORDER BY TagName", ())
        .await?;
    while let Some(row) = rows.next().await? {
        let name = row
            .get_value(0)?
            .as_text()
            .cloned()
            .ok_or(StoreError::UnexpectedValue {
                context: "Sample.TagName",
            })?;
        if entries[..cataloged].iter().any(|e| e.name == name) {
            continue;
        }
        entries.push(CatalogEntry {
            name,
            tag_type: None,
            comment: None,
        });
    }

    Ok(entries)
}

/// Whether `name` already has a catalog row.
async fn catalog_contains(conn: &turso::Connection, name: &str) -> Result<bool> {
    let mut rows = conn
        .query("SELECT 1 FROM TagCatalog WHERE TagName = ?1 LIMIT 1", [name])
        .await?;
    Ok(rows.next().await?.is_some())
}

/// Insert catalog rows, skipping names already present.
pub(crate) async fn insert_catalog_entries(db: &Database, entries: &[CatalogEntry]) -> Result<()> {
    let conn = db.connect()?;
    for entry in entries {
        if catalog_contains(&conn, &entry.name).await? {
            continue;
        }
        conn.execute(
            "INSERT INTO TagCatalog (TagName, TagType, TagComment) VALUES (?1, ?2, ?3)",
            [
                entry.name.as_str(),
                entry.tag_type.as_deref().unwrap_or(""),
                entry.comment.as_deref().unwrap_or(""),
            ],
        )
        .await?;
    }
    Ok(())
}

impl StoreManager {
    /// Append a batch of samples, each to the day store of its own date.
    ///
    /// A poll pass produces same-instant samples, but a batch landing
    /// right at midnight can carry two dates, so samples are grouped by
    /// UTC date first. Catalog rows for new names and the sample rows of
    /// one day are written in one transaction under the write gate.
    /// Returns the number of sample rows written.
    pub async fn append_samples(&self, samples: &[Sample]) -> Result<u64> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut by_day: BTreeMap<NaiveDate, Vec<&Sample>> = BTreeMap::new();
        for sample in samples {
            by_day
                .entry(sample.time.date_naive())
                .or_default()
                .push(sample);
        }

        // Resolve day databases before taking the gate; creating a fresh
        // day seeds its catalog under the gate itself.
        let mut partitions = Vec::with_capacity(by_day.len());
        for (day, group) in by_day {
            let db = self.day_db(day).await?;
            partitions.push((group, db));
        }

        let _gate = self.acquire_write_gate().await?;
        let mut written = 0u64;
        for (group, db) in &partitions {
            let conn = db.connect()?;

            conn.execute("BEGIN", ()).await?;
            match Self::write_batch(&conn, group).await {
                Ok(count) => {
                    conn.execute("COMMIT", ()).await?;
                    written += count;
                }
                Err(e) => {
                    let _ = conn.execute("ROLLBACK", ()).await;
                    return Err(e);
                }
            }
        }
        Ok(written)
    }

    async fn write_batch(conn: &turso::Connection, samples: &[&Sample]) -> Result<u64> {
        // Catalog each name once per batch.
        let mut seen: Vec<&str> = Vec::new();
        for sample in samples {
            if !seen.contains(&sample.name.as_str()) {
                seen.push(&sample.name);
                if !catalog_contains(conn, &sample.name).await? {
                    conn.execute(
                        "INSERT INTO TagCatalog (TagName, TagType, TagComment) \
                         VALUES (?1, '', '')",
                        [sample.name.as_str()],
                    )
                    .await?;
                }
            }
        }

        let mut written = 0u64;
        for sample in samples {
            let time = sample.time.to_rfc3339();
            let value = sample.value.to_string();
            written += conn
                .execute(
                    "INSERT INTO Sample (Time, TagName, TagValue) VALUES (?1, ?2, ?3)",
                    [time.as_str(), sample.name.as_str(), value.as_str()],
                )
                .await?;
        }

        Ok(written)
    }

    /// All samples recorded for `name` on `day`, in insertion order.
    pub async fn samples_for(&self, day: NaiveDate, name: &str) -> Result<Vec<(String, f64)>> {
        let db = self.day_db(day).await?;
        let conn = db.connect()?;

        let mut out = Vec::new();
        let mut rows = conn
            .query(
                "SELECT Time, TagValue FROM Sample WHERE TagName = ?1 ORDER BY rowid",
                [name],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let time = row
                .get_value(0)?
                .as_text()
                .cloned()
                .ok_or(StoreError::UnexpectedValue {
                    context: "Sample.Time",
                })?;
            let value = value_to_f64(row.get_value(1)?).ok_or(StoreError::UnexpectedValue {
                context: "Sample.TagValue",
            })?;
            out.push((time, value));
        }

        Ok(out)
    }

    /// The tag catalog for `day`, catalog-only rows.
    pub async fn catalog(&self, day: NaiveDate) -> Result<Vec<CatalogEntry>> {
        let db = self.day_db(day).await?;
        full_catalog(&db).await
    }
}

/// Coerce a NUMERIC column value to f64.
fn value_to_f64(value: turso::Value) -> Option<f64> {
    match value {
        turso::Value::Integer(i) => Some(i as f64),
        turso::Value::Real(f) => Some(f),
        turso::Value::Text(s) => s.parse().ok(),
        _ => None,
    }
}
