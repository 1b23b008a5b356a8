// SQLite persistence layer: the durable `KeyValueStore` backend.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::kv::{KeyValueStore, StorageError};

/// SQLite-backed key-value table standing in for the browser's
/// `localStorage`. One row per storage key; values are JSON text.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_entries (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Self::migrate_legacy_local_storage(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Databases exported from the browser build carry a bare
    /// `local_storage(key, value)` table. Copy its rows into `kv_entries`
    /// (existing keys win) and drop it.
    fn migrate_legacy_local_storage(conn: &Connection) -> Result<()> {
        let has_legacy: bool = conn
            .prepare("SELECT key, value FROM local_storage LIMIT 0")
            .is_ok();

        if !has_legacy {
            return Ok(());
        }

        conn.execute_batch(
            "
            INSERT OR IGNORE INTO kv_entries (key, value)
                SELECT key, value FROM local_storage WHERE value IS NOT NULL;

            DROP TABLE local_storage;
            ",
        )
        .context("failed to migrate legacy local_storage table")?;

        Ok(())
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read kv entry")
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value      = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )
        .context("failed to write kv entry")?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .context("failed to delete kv entry")?;
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT key FROM kv_entries ORDER BY key")
            .context("failed to prepare key scan")?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .context("failed to scan keys")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map key rows")?;
        Ok(keys)
    }
}

fn backend_error(e: anyhow::Error) -> StorageError {
    StorageError::Backend(format!("{e:#}"))
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        self.read(key).map_err(backend_error)
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        self.write(key, value).map_err(backend_error)
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        self.delete(key).map_err(backend_error)
    }

    fn keys(&self) -> std::result::Result<Vec<String>, StorageError> {
        self.list_keys().map_err(backend_error)
    }
}
