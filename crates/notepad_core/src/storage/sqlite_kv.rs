//! Local key/value storage backend on SQLite.
//!
//! # Responsibility
//! - Keep the whole page collection as one JSON document under a fixed key.
//!
//! # Invariants
//! - One row per namespace key in `kv_store`; writes replace it atomically.
//! - A missing or malformed document loads as an empty collection.
//! - `SQLITE_FULL` surfaces as `StorageError::QuotaExceeded`.

use crate::db::migrations::apply_migrations;
use crate::db::{open_db, open_db_in_memory};
use crate::model::page::Page;
use crate::storage::{PageStorage, StorageError, StorageResult};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Namespace key the page collection is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "notepad-pages";

/// Synchronous key/value page storage.
pub struct SqliteKvStorage {
    conn: Connection,
    key: String,
}

impl SqliteKvStorage {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::with_connection(open_db(path)?))
    }

    /// Opens a private in-memory database; data lives as long as `self`.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::with_connection(open_db_in_memory()?))
    }

    /// Wraps a caller-provided connection, applying pending migrations.
    pub fn from_connection(mut conn: Connection) -> StorageResult<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self::with_connection(conn))
    }

    /// Stores the collection under `key` instead of the default namespace.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Raw stored document, if any.
    pub fn raw_value(&self) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrites the stored document verbatim.
    pub fn write_raw_value(&self, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.key.as_str(), value],
        )?;
        Ok(())
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl PageStorage for SqliteKvStorage {
    fn load(&self) -> StorageResult<Vec<Page>> {
        let Some(raw) = self.raw_value()? else {
            debug!(
                "event=storage_load module=storage backend=sqlite_kv status=ok pages=0 reason=missing_key"
            );
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Page>>(&raw) {
            Ok(pages) => {
                debug!(
                    "event=storage_load module=storage backend=sqlite_kv status=ok pages={}",
                    pages.len()
                );
                Ok(pages)
            }
            Err(err) => {
                warn!(
                    "event=storage_load module=storage backend=sqlite_kv status=error error_code=malformed_document bytes={} error={}",
                    raw.len(),
                    err
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_all(&self, pages: &[Page]) -> StorageResult<()> {
        let document = serde_json::to_string(pages)
            .map_err(|err| StorageError::Unavailable(format!("failed to encode pages: {err}")))?;
        self.write_raw_value(&document)?;
        debug!(
            "event=storage_save module=storage backend=sqlite_kv status=ok pages={} bytes={}",
            pages.len(),
            document.len()
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite_kv"
    }
}
