//! Cache store contract and item codec.
//!
//! The repository talks to its cache through [`CacheStore`], a minimal
//! memcached-shaped interface over opaque bytes. Stores are treated as
//! unreliable: a backend error is handled exactly like a miss.
//!
//! Items are stored under `item:<id>` keys, encoded with bincode. The
//! encoding is internal to this crate and carries no compatibility promise
//! across versions; a decode failure is just another miss.
//!
//! [`MemoryCacheStore`] is the in-process implementation. A shared backend
//! (memcached, redis) only needs to implement the trait and be handed to
//! [`HuginnBuilder::cache_store()`](crate::HuginnBuilder::cache_store).

pub mod memory;

pub use memory::{CacheConfig, MemoryCacheStore};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::types::{Item, ItemId};

/// Key/value store with per-entry time-to-live.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a single key. `Ok(None)` on miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Look up many keys at once, returning only the subset found.
    ///
    /// Default implementation calls [`get`](Self::get) per key and skips
    /// keys that error.
    async fn multi_get(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Ok(Some(bytes)) = self.get(key).await {
                found.insert(key.clone(), bytes);
            }
        }
        Ok(found)
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

/// Cache key for an item id.
pub fn item_cache_key(id: ItemId) -> String {
    format!("item:{id}")
}

/// Encode an item for storage.
pub fn encode_item(item: &Item) -> Result<Vec<u8>> {
    Ok(bincode::serialize(item)?)
}

/// Decode an item previously produced by [`encode_item`].
pub fn decode_item(bytes: &[u8]) -> Result<Item> {
    Ok(bincode::deserialize(bytes)?)
}
