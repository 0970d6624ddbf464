//! In-process cache store.
//!
//! Backed by moka's async cache with a per-entry expiry policy, so each
//! [`set`](super::CacheStore::set) can carry its own TTL (list views and
//! single-item views may use different TTLs against the same store).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::CacheStore;
use crate::Result;

/// Configuration for [`MemoryCacheStore`].
///
/// ```rust
/// # use huginn::CacheConfig;
/// let config = CacheConfig::new().max_entries(5_000);
/// assert_eq!(config.max_entries, 5_000);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }
}

#[derive(Clone)]
struct Entry {
    bytes: Vec<u8>,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Thread-safe in-memory [`CacheStore`].
pub struct MemoryCacheStore {
    entries: Cache<String, Entry>,
}

impl MemoryCacheStore {
    /// Create a store with the default capacity (10,000 entries).
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }

    /// Number of live entries.
    ///
    /// Moka updates its counters lazily; call [`sync`](Self::sync) first when
    /// an exact figure matters.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a non-expired entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Flush pending maintenance so [`len`](Self::len) is accurate.
    pub async fn sync(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).await.map(|e| e.bytes))
    }

    async fn multi_get(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.entries.get(key).await {
                found.insert(key.clone(), entry.bytes);
            }
        }
        Ok(found)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), Entry { bytes: value, ttl })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit() {
        let store = MemoryCacheStore::new();
        assert!(store.get("item:1").await.unwrap().is_none());

        store
            .set("item:1", vec![1, 2, 3], Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("item:1").await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn multi_get_returns_found_subset() {
        let store = MemoryCacheStore::new();
        store
            .set("item:1", vec![1], Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("item:3", vec![3], Duration::from_secs(60))
            .await
            .unwrap();

        let keys = vec!["item:1".to_string(), "item:2".to_string(), "item:3".to_string()];
        let found = store.multi_get(&keys).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["item:1"], vec![1]);
        assert_eq!(found["item:3"], vec![3]);
        assert!(!found.contains_key("item:2"));
    }

    #[tokio::test]
    async fn entry_expires_after_its_own_ttl() {
        let store = MemoryCacheStore::new();
        store
            .set("short", vec![1], Duration::from_millis(30))
            .await
            .unwrap();
        store
            .set("long", vec![2], Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get("short").await.unwrap().is_none());
        assert_eq!(store.get("long").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_ttl() {
        let store = MemoryCacheStore::new();
        store
            .set("k", vec![1], Duration::from_millis(30))
            .await
            .unwrap();
        store
            .set("k", vec![2], Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn len_after_sync() {
        let store = MemoryCacheStore::new();
        assert!(store.is_empty());
        for i in 0..3u8 {
            store
                .set(&format!("item:{i}"), vec![i], Duration::from_secs(60))
                .await
                .unwrap();
        }
        store.sync().await;
        assert_eq!(store.len(), 3);
        assert!(store.contains_key("item:2"));
    }

    #[tokio::test]
    async fn clear_evicts_everything() {
        let store = MemoryCacheStore::new();
        store
            .set("item:1", vec![1], Duration::from_secs(60))
            .await
            .unwrap();
        store.clear();
        assert!(store.get("item:1").await.unwrap().is_none());
    }
}
