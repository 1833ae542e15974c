//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of the StateStore
//! trait. Blocking SQLite calls run on tokio's blocking pool.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StateStore, StorageError, StorageResult, WriteBatch};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite key/value backend
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory database (for tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            upsert(conn, &key, &value)?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for key in &batch.removes {
                tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            }
            for (key, value) in &batch.sets {
                upsert(&tx, key, value)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let prefix = prefix.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_remove_ignores_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        store.remove(&["a", "nope"]).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_write_batch_applies_removes_then_sets() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("flag", "old").await.unwrap();
        store.set("gone", "x").await.unwrap();

        let batch = WriteBatch::new()
            .remove("gone")
            .remove("flag")
            .set("flag", "new")
            .set("plan", "{}");
        store.write_batch(batch).await.unwrap();

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.get("flag").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.get("plan").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("ns:b", "1").await.unwrap();
        store.set("ns:a", "1").await.unwrap();
        store.set("other", "1").await.unwrap();
        store.set("ns_like", "1").await.unwrap();

        let keys = store.keys_with_prefix("ns:").await.unwrap();
        assert_eq!(keys, vec!["ns:a", "ns:b"]);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("plan", r#"{"cursor":3}"#).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("plan").await.unwrap().as_deref(),
            Some(r#"{"cursor":3}"#)
        );
    }
}
