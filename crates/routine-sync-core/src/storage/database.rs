//! SQLite-backed preference store.
//!
//! Mirrors the companion app's preference file locally:
//! - one row per key, value kept as JSON so the type survives
//! - every batch runs inside one transaction

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{Result, StoreError};
use crate::prefs::{PrefEdit, PrefStore, PrefValue};

/// SQLite preference store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the store at `<data_dir>/prefs.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("prefs.db");
        Self::open_path(&path)
    }

    /// Open the store at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<PrefValue>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                StoreError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    fn write_batch(&self, edits: &[PrefEdit]) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<(), rusqlite::Error> = (|| {
            for edit in edits {
                match edit {
                    PrefEdit::Put(key, value) => {
                        let encoded = serde_json::to_string(value)
                            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                        self.conn.execute(
                            "INSERT INTO prefs (key, value, updated_at)
                             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                             ON CONFLICT(key) DO UPDATE SET
                                value = excluded.value,
                                updated_at = excluded.updated_at",
                            params![key, encoded],
                        )?;
                    }
                    PrefEdit::Remove(key) => {
                        self.conn
                            .execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
                    }
                }
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

impl PrefStore for SqliteStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read preference");
                None
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        let result: Result<Vec<String>, rusqlite::Error> = (|| {
            let mut stmt = self.conn.prepare("SELECT key FROM prefs ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let keys = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })();
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list preference keys");
            Vec::new()
        })
    }

    fn apply(&mut self, edits: Vec<PrefEdit>) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        self.write_batch(&edits)?;
        Ok(())
    }
}
