//! Upstream source traits.
//!
//! An [`ItemSource`] resolves exactly one id per call and never retries.
//! Concurrency and deadlines are the business of
//! [`BoundedFetcher`](crate::fetch::BoundedFetcher); retries, when wanted,
//! come from wrapping a source in
//! [`RetryingItemSource`](super::RetryingItemSource).

use async_trait::async_trait;

use crate::Result;
use crate::types::{Item, ItemId};

/// Single-item upstream lookup.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Source name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch one item.
    ///
    /// Returns `NotFound` when the upstream has no such item.
    async fn fetch_item(&self, id: ItemId) -> Result<Item>;
}

/// Source of ranked story id lists.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Ids of the current top stories, best first.
    async fn top_story_ids(&self) -> Result<Vec<ItemId>>;
}
