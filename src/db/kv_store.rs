use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreError;

/// Durable key-value store backed by an embedded SQLite database.
///
/// The server uses exactly one record (the shelter document), but the
/// contract is a generic put/get/delete: a put overwrites any existing
/// value for the key.
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self::bootstrap(conn)?;
        info!("key-value store opened at {}", path.as_ref().display());
        Ok(store)
    }

    /// Open an in-memory store. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Insert or overwrite the value stored under `key`.
    pub fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Fetch the value stored under `key`, `None` when the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Delete the value stored under `key`, a no-op when the key is absent.
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_round_trip() {
        let store = KvStore::open_in_memory().unwrap();
        assert_eq!(store.get("data").unwrap(), None);

        store.put("data", "{\"a\":1}").unwrap();
        assert_eq!(store.get("data").unwrap().as_deref(), Some("{\"a\":1}"));

        store.put("data", "{\"a\":2}").unwrap();
        assert_eq!(store.get("data").unwrap().as_deref(), Some("{\"a\":2}"));

        store.delete("data").unwrap();
        assert_eq!(store.get("data").unwrap(), None);
    }

    #[test]
    fn delete_missing_key_is_a_no_op() {
        let store = KvStore::open_in_memory().unwrap();
        store.delete("missing").unwrap();
    }
}
