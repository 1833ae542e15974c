//! Time-limited cache entries
//!
//! Supplementary state (the last crawl report, for instance) is stored with
//! the time it was written. Entries older than the configured maximum age
//! read as absent and are evicted on the read that notices.

use crate::storage::keys::CACHE_NAMESPACE;
use crate::storage::traits::{StateStore, StorageResult};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry<T> {
    data: T,
    written_at: DateTime<Utc>,
}

/// TTL cache layered over a state store
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn StateStore>,
    max_age: Duration,
}

impl TtlCache {
    pub fn new(store: Arc<dyn StateStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stores `data` under `name`, stamped with the current time
    pub async fn put<T: Serialize + Sync>(&self, name: &str, data: &T) -> StorageResult<()> {
        let entry = CacheEntry {
            data,
            written_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&cache_key(name), &json).await
    }

    /// Reads `name` if it is younger than the maximum age
    pub async fn get<T: DeserializeOwned>(&self, name: &str) -> StorageResult<Option<T>> {
        self.get_at(name, Utc::now()).await
    }

    pub(crate) async fn get_at<T: DeserializeOwned>(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<T>> {
        let key = cache_key(name);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Evicting unreadable cache entry {}: {}", name, e);
                self.store.remove(&[key.as_str()]).await?;
                return Ok(None);
            }
        };

        if now - entry.written_at > self.max_age {
            tracing::debug!("Cache entry {} expired, evicting", name);
            self.store.remove(&[key.as_str()]).await?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(entry.data)?))
    }

    /// Removes every expired or unreadable cache entry
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> StorageResult<usize> {
        let now = Utc::now();
        let mut expired = Vec::new();

        for key in self.store.keys_with_prefix(CACHE_NAMESPACE).await? {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            let keep = serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw)
                .map(|entry| now - entry.written_at <= self.max_age)
                .unwrap_or(false);
            if !keep {
                expired.push(key);
            }
        }

        if !expired.is_empty() {
            let keys: Vec<&str> = expired.iter().map(String::as_str).collect();
            self.store.remove(&keys).await?;
        }

        Ok(expired.len())
    }
}

fn cache_key(name: &str) -> String {
    format!("{}{}", CACHE_NAMESPACE, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn cache(max_age_secs: i64) -> (Arc<MemoryStore>, TtlCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = TtlCache::new(store.clone(), Duration::seconds(max_age_secs));
        (store, cache)
    }

    #[tokio::test]
    async fn test_fresh_entry_is_returned() {
        let (_, cache) = cache(300);
        cache.put("answer", &42u32).await.unwrap();

        let value: Option<u32> = cache.get("answer").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let (store, cache) = cache(300);
        cache.put("answer", &42u32).await.unwrap();

        let later = Utc::now() + Duration::seconds(301);
        let value: Option<u32> = cache.get_at("answer", later).await.unwrap();

        assert_eq!(value, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_evicted() {
        let (store, cache) = cache(300);
        store.set(&cache_key("broken"), "not json").await.unwrap();

        let value: Option<u32> = cache.get("broken").await.unwrap();
        assert_eq!(value, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_leaves_other_namespaces() {
        let (store, cache) = cache(300);
        cache.put("fresh", &1u32).await.unwrap();

        let old = CacheEntry {
            data: 2u32,
            written_at: Utc::now() - Duration::seconds(600),
        };
        store
            .set(&cache_key("stale"), &serde_json::to_string(&old).unwrap())
            .await
            .unwrap();
        store.set("tidewalk:crawl:v1:plan", "{}").await.unwrap();

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("tidewalk:crawl:v1:plan").await.unwrap().is_some());
    }
}
