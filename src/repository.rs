//! Cache-aside item repository.
//!
//! [`CachedItemRepository::get`] turns an ordered id list into an ordered
//! item list:
//!
//! 1. one `multi_get` against the [`CacheStore`] for the distinct ids,
//! 2. a [`BoundedFetcher`] batch for the misses,
//! 3. a write-back of every fetched item with the configured TTL,
//! 4. a final pass restoring the caller's id order.
//!
//! The call never fails as a whole. Ids that cannot be resolved are logged
//! and left out. When the context is cancelled or its deadline passes, the
//! repository stops waiting and returns whatever it has assembled so far,
//! cache hits included.
//!
//! Cache I/O never holds a call past its context. A lookup still pending
//! when the context ends counts as all misses, and write-backs run as
//! spawned tasks that outlive the call if they have to.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheStore, decode_item, encode_item, item_cache_key};
use crate::context::Context;
use crate::fetch::{BoundedFetcher, FetchOutcome};
use crate::telemetry;
use crate::types::{Item, ItemId};

/// Default time-to-live for items written back after a fetch.
pub const DEFAULT_ITEM_TTL: Duration = Duration::from_secs(60);

/// Configuration for [`CachedItemRepository`].
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// TTL for cache write-backs. Default: 60s.
    pub ttl: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_ITEM_TTL,
        }
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write-back TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Ordered, best-effort item lookup.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Resolve `ids` into items, in the order requested.
    ///
    /// Unresolvable ids are absent from the result. Never returns more
    /// items than ids requested, nor items whose id was not requested.
    async fn get(&self, ctx: &Context, ids: &[ItemId]) -> Vec<Item>;
}

/// [`ItemRepository`] backed by a cache store and a bounded fetcher.
#[derive(Clone)]
pub struct CachedItemRepository {
    cache: Arc<dyn CacheStore>,
    fetcher: BoundedFetcher,
    ttl: Duration,
}

impl CachedItemRepository {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        fetcher: BoundedFetcher,
        config: &RepositoryConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Capacity of the underlying fetcher's limiter.
    pub fn max_concurrent(&self) -> usize {
        self.fetcher.max_concurrent()
    }

    /// Look up every id in one round trip. Backend errors, undecodable
    /// entries and a lookup outlasting the context count as misses.
    async fn lookup_cached(&self, ctx: &Context, ids: &[ItemId]) -> HashMap<ItemId, Item> {
        let keys: Vec<String> = ids.iter().map(|id| item_cache_key(*id)).collect();
        let lookup = tokio::select! {
            biased;
            found = self.cache.multi_get(&keys) => found,
            _ = ctx.done() => {
                warn!(keys = keys.len(), "context done during cache lookup, treating as misses");
                Ok(HashMap::new())
            }
        };
        let found = match lookup {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, keys = keys.len(), "cache lookup failed, treating as misses");
                HashMap::new()
            }
        };

        let mut hits = HashMap::with_capacity(found.len());
        for (id, key) in ids.iter().zip(&keys) {
            let Some(bytes) = found.get(key) else {
                continue;
            };
            match decode_item(bytes) {
                Ok(item) if item.id == *id => {
                    hits.insert(*id, item);
                }
                Ok(item) => {
                    warn!(%key, found = item.id, "cache entry holds a different item, ignoring");
                }
                Err(e) => {
                    warn!(%key, error = %e, "failed to decode cache entry, ignoring");
                }
            }
        }

        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(hits.len() as u64);
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment((ids.len() - hits.len()) as u64);
        hits
    }

    /// Write a freshly fetched item back on its own task. Failures are
    /// logged and ignored.
    fn spawn_write_back(&self, item: &Item) -> Option<JoinHandle<()>> {
        let key = item_cache_key(item.id);
        let bytes = match encode_item(item) {
            Ok(bytes) => bytes,
            Err(e) => {
                metrics::counter!(telemetry::CACHE_WRITE_ERRORS_TOTAL).increment(1);
                warn!(%key, error = %e, "failed to encode item for cache");
                return None;
            }
        };

        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        Some(tokio::spawn(async move {
            match cache.set(&key, bytes, ttl).await {
                Ok(()) => debug!(%key, "wrote to cache"),
                Err(e) => {
                    metrics::counter!(telemetry::CACHE_WRITE_ERRORS_TOTAL).increment(1);
                    warn!(%key, error = %e, "failed to write to cache");
                }
            }
        }))
    }

    /// Fetch the misses, accumulating into `resolved` until the batch is
    /// exhausted or the context is done.
    async fn fetch_misses(
        &self,
        ctx: &Context,
        misses: Vec<ItemId>,
        resolved: &mut HashMap<ItemId, Item>,
    ) {
        let requested = misses.len();
        let mut outcomes = self.fetcher.fetch_many(ctx, misses);
        let mut writes = Vec::new();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = ctx.done() => {
                    let reason = ctx.err().map(|e| e.to_string()).unwrap_or_default();
                    warn!(
                        error = %reason,
                        requested,
                        "context done while waiting on fetches, returning partial result"
                    );
                    break;
                }
                next = outcomes.next() => next,
            };

            let Some(FetchOutcome { id, result }) = outcome else {
                break;
            };

            match result {
                Ok(item) if item.id == id => {
                    writes.extend(self.spawn_write_back(&item));
                    resolved.insert(id, item);
                }
                Ok(item) => {
                    warn!(id, found = item.id, "fetched item has a different id, dropping");
                }
                Err(e) if e.is_cancellation() => {
                    warn!(id, error = %e, requested, "fetch cancelled, returning partial result");
                    break;
                }
                Err(e) => {
                    warn!(id, error = %e, "failed to hydrate item, dropping");
                }
            }
        }

        if writes.is_empty() {
            return;
        }
        // Wait for write-backs while the context allows; the rest finish detached.
        let pending = writes.len();
        tokio::select! {
            biased;
            _ = ctx.done() => {
                debug!(pending, "context done, cache writes continue in background");
            }
            _ = join_all(writes) => {}
        }
    }
}

#[async_trait]
impl ItemRepository for CachedItemRepository {
    async fn get(&self, ctx: &Context, ids: &[ItemId]) -> Vec<Item> {
        if ids.is_empty() {
            return Vec::new();
        }

        let unique = distinct(ids);
        let mut resolved = self.lookup_cached(ctx, &unique).await;
        debug!(requested = unique.len(), hits = resolved.len(), "cache lookup complete");

        let misses: Vec<ItemId> = unique
            .into_iter()
            .filter(|id| !resolved.contains_key(id))
            .collect();

        if !misses.is_empty() {
            debug!(?misses, "hydrating cache misses");
            self.fetch_misses(ctx, misses, &mut resolved).await;
        }

        order_by_request(ids, &resolved)
    }
}

/// Distinct ids in first-occurrence order.
fn distinct(ids: &[ItemId]) -> Vec<ItemId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// One item per requested position, skipping unresolved ids.
fn order_by_request(ids: &[ItemId], resolved: &HashMap<ItemId, Item>) -> Vec<Item> {
    ids.iter().filter_map(|id| resolved.get(id).cloned()).collect()
}
