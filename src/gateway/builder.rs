//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use crate::cache::{CacheConfig, CacheStore, MemoryCacheStore};
use crate::conversation::{ConversationBuilder, ConversationConfig};
use crate::fetch::{BoundedFetcher, FetcherConfig};
use crate::providers::firebase::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::providers::{FeedSource, FirebaseClient, ItemSource, RetryConfig, RetryingItemSource};
use crate::repository::{CachedItemRepository, RepositoryConfig};
use crate::{HuginnError, Result};

/// Main entry point for creating gateway instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// ```rust
/// # use huginn::Huginn;
/// # use std::time::Duration;
/// let gateway = Huginn::builder()
///     .max_concurrent(16)
///     .item_ttl(Duration::from_secs(300))
///     .build()
///     .unwrap();
/// assert_eq!(gateway.max_concurrent(), 16);
/// ```
pub struct HuginnBuilder {
    base_url: String,
    request_timeout: Duration,
    fetcher: FetcherConfig,
    repository: RepositoryConfig,
    conversation: ConversationConfig,
    cache: CacheConfig,
    retry: Option<RetryConfig>,
    cache_store: Option<Arc<dyn CacheStore>>,
    item_source: Option<Arc<dyn ItemSource>>,
    feed_source: Option<Arc<dyn FeedSource>>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetcher: FetcherConfig::default(),
            repository: RepositoryConfig::default(),
            conversation: ConversationConfig::default(),
            cache: CacheConfig::default(),
            retry: None,
            cache_store: None,
            item_source: None,
            feed_source: None,
        }
    }

    /// Upstream base URL (default: the public Hacker News API).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Timeout for each individual upstream request (default: 10s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Maximum concurrent upstream calls (default: 32).
    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.fetcher = self.fetcher.max_concurrent(n);
        self
    }

    /// TTL for items written to the cache (default: 60s).
    pub fn item_ttl(mut self, ttl: Duration) -> Self {
        self.repository = self.repository.ttl(ttl);
        self
    }

    /// Maximum reply depth hydrated by conversations (default: 64).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.conversation = self.conversation.max_depth(depth);
        self
    }

    /// Capacity of the default in-memory cache. Ignored when a custom store
    /// is supplied via [`cache_store()`](Self::cache_store).
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Retry transient upstream failures. Off by default.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Use a custom cache backend instead of the in-memory store.
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Use a custom item source instead of the HTTP client.
    pub fn item_source(mut self, source: Arc<dyn ItemSource>) -> Self {
        self.item_source = Some(source);
        self
    }

    /// Use a custom top-stories source instead of the HTTP client.
    pub fn feed_source(mut self, source: Arc<dyn FeedSource>) -> Self {
        self.feed_source = Some(source);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        if self.request_timeout.is_zero() {
            return Err(HuginnError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let client = FirebaseClient::with_base_url(&self.base_url, self.request_timeout)?;

        let mut source: Arc<dyn ItemSource> = match self.item_source {
            Some(source) => source,
            None => Arc::new(client.clone()),
        };
        if let Some(retry) = self.retry {
            source = Arc::new(RetryingItemSource::new(source, retry));
        }
        let feed: Arc<dyn FeedSource> = match self.feed_source {
            Some(feed) => feed,
            None => Arc::new(client),
        };

        let cache: Arc<dyn CacheStore> = match self.cache_store {
            Some(store) => store,
            None => Arc::new(MemoryCacheStore::with_config(&self.cache)),
        };

        let fetcher = BoundedFetcher::new(source, &self.fetcher);
        let repository = Arc::new(CachedItemRepository::new(cache, fetcher, &self.repository));
        let conversations = ConversationBuilder::new(repository.clone(), &self.conversation);

        Ok(Gateway::new(repository, conversations, feed))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
