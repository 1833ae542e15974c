//! Storage traits and error types
//!
//! This module defines the trait interface for durable key/value backends and
//! associated error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A set of writes applied together
///
/// Backends apply every `set` and `remove` in a batch atomically: either all
/// of them are visible afterwards or none are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub sets: Vec<(String, String)>,
    pub removes: Vec<String>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sets.push((key.into(), value.into()));
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.removes.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.removes.is_empty()
    }
}

/// Trait for durable key/value backends
///
/// Values are opaque strings (JSON in practice). A store outlives the process
/// lifetime that wrote to it; it is the only channel between lifetimes.
/// Exactly one writer is assumed.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads a value, or `None` if the key is absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes every listed key; missing keys are ignored
    async fn remove(&self, keys: &[&str]) -> StorageResult<()>;

    /// Applies all sets and removes in the batch atomically
    ///
    /// Removes are applied before sets, so a key present in both ends up set.
    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Lists keys starting with `prefix`, sorted
    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
