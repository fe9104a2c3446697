//! Persistent catalog snapshots
//!
//! The last completed pass is kept in SQLite so a restart can serve
//! immediately instead of waiting for the first pass. Snapshots are plain
//! serialized payloads tagged with a schema number; anything that does not
//! match the current schema is ignored and the process starts cold.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::DateTime;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::types::Catalog;

/// Bumped whenever the persisted payload layout changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening snapshot store at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS published (
                key TEXT PRIMARY KEY,
                schema INTEGER NOT NULL,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// Persists a catalog, replacing any previous snapshot atomically.
    pub fn publish(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let details = serde_json::to_string(&catalog.details)?;
        let feed = serde_json::to_string(&catalog.feed)?;
        let updated_at = catalog.generated_at.timestamp_millis();

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        for (key, payload) in [("details", details), ("feed", feed)] {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO published (key, schema, payload, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                (key, SCHEMA_VERSION, payload, updated_at),
            )?;
        }
        tx.commit()?;

        debug!(
            "Published snapshot with {} repository details",
            catalog.details.len()
        );
        Ok(())
    }

    /// Loads the stored snapshot, or `None` when there is none usable.
    pub fn load(&self) -> Result<Option<Catalog>, StoreError> {
        let conn = self.lock_conn()?;
        let Some((details_payload, updated_at)) = Self::read_row(&conn, "details")? else {
            return Ok(None);
        };
        let Some((feed_payload, _)) = Self::read_row(&conn, "feed")? else {
            return Ok(None);
        };
        drop(conn);

        let Some(generated_at) = DateTime::from_timestamp_millis(updated_at) else {
            warn!("Stored snapshot has an invalid timestamp, starting cold");
            return Ok(None);
        };

        let details = serde_json::from_str(&details_payload)?;
        let feed = serde_json::from_str(&feed_payload)?;
        Ok(Some(Catalog {
            generated_at,
            details,
            feed,
        }))
    }

    fn read_row(conn: &Connection, key: &str) -> Result<Option<(String, i64)>, StoreError> {
        let result = conn.query_row(
            "SELECT schema, payload, updated_at FROM published WHERE key = ?1",
            [key],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        );

        match result {
            Ok((schema, payload, updated_at)) => {
                if schema != SCHEMA_VERSION {
                    warn!(
                        "Stored snapshot has schema v{}, expected v{}, starting cold",
                        schema, SCHEMA_VERSION
                    );
                    return Ok(None);
                }
                Ok(Some((payload, updated_at)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
