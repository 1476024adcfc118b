//! SQLite-backed key-value storage.
//!
//! Holds the completion store under a single `kv` table. Multi-key writes go
//! through one transaction so a failed save never leaves half of the state
//! replaced.

use rusqlite::{params, Connection};
use std::path::Path;

use super::data_dir;
use super::kv::KeyValueStore;
use crate::error::{CoreError, StoreError};

/// SQLite database for planner state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studyplan/studyplan.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studyplan.db");
        Ok(Self::open_path(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.kv_set(key, value)?)
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn set_many_is_visible_after_commit() {
        let mut db = Database::open_memory().unwrap();
        db.set_many(&[("completed_topics", "[]"), ("completed_reviews", "[]")])
            .unwrap();
        assert_eq!(db.get("completed_topics").unwrap().as_deref(), Some("[]"));
        assert_eq!(db.get("completed_reviews").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.db");
        {
            let mut db = Database::open_path(&path).unwrap();
            db.set("k", "v").unwrap();
        }
        let db = Database::open_path(&path).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v"));
    }
}
