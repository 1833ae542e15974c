//! Storage module for persisting crawl state
//!
//! This module is the durable memory of a crawl. Nothing else survives a
//! navigation, so it handles:
//! - Key/value backends (SQLite on disk, in-memory for tests)
//! - The namespaced key layout for the plan and its one-shot flags
//! - Typed plan persistence with atomic start/finish writes
//! - A TTL cache for supplementary entries

pub mod keys;

mod cache;
mod memory;
mod plan_store;
mod schema;
mod sqlite;
mod traits;

pub use cache::TtlCache;
pub use memory::MemoryStore;
pub use plan_store::{NavigationTarget, PlanStore};
pub use sqlite::SqliteStore;
pub use traits::{StateStore, StorageError, StorageResult, WriteBatch};

use std::path::Path;

/// Opens the on-disk store at `path`
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened or created store
/// * `Err(StorageError)` - Failed to open the database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::open(path)
}
