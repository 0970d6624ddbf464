//! Gateway - the assembled repository, conversation builder and feed

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::context::Context;
use crate::conversation::ConversationBuilder;
use crate::providers::FeedSource;
use crate::repository::{CachedItemRepository, ItemRepository};
use crate::types::{Conversation, ConversationNode, Item, ItemId, ItemThread};
use crate::{HuginnError, Result};

/// Entry point for item, thread and feed lookups.
pub struct Gateway {
    repository: Arc<CachedItemRepository>,
    conversations: ConversationBuilder,
    feed: Arc<dyn FeedSource>,
}

impl Gateway {
    pub(crate) fn new(
        repository: Arc<CachedItemRepository>,
        conversations: ConversationBuilder,
        feed: Arc<dyn FeedSource>,
    ) -> Self {
        Self {
            repository,
            conversations,
            feed,
        }
    }

    pub fn repository(&self) -> &CachedItemRepository {
        &self.repository
    }

    pub fn conversations(&self) -> &ConversationBuilder {
        &self.conversations
    }

    pub fn max_concurrent(&self) -> usize {
        self.repository.max_concurrent()
    }

    pub fn item_ttl(&self) -> Duration {
        self.repository.ttl()
    }

    /// Resolve `ids` in request order, dropping ids that cannot be resolved.
    pub async fn items(&self, ctx: &Context, ids: &[ItemId]) -> Vec<Item> {
        self.repository.get(ctx, ids).await
    }

    /// Resolve one item together with its whole discussion.
    ///
    /// Fails with `NotFound` if the item itself cannot be resolved, or with
    /// the context error if the context ended first. Replies that cannot be
    /// resolved are simply missing from the thread.
    pub async fn item_thread(&self, ctx: &Context, id: ItemId) -> Result<ItemThread> {
        let Some(item) = self.repository.get(ctx, &[id]).await.into_iter().next() else {
            return Err(ctx.err().unwrap_or(HuginnError::NotFound(id)));
        };

        let conversation = if item.has_kids() {
            self.conversations
                .build_conversation(ctx, item.id, &item.kids)
                .await
        } else {
            Conversation {
                root: ConversationNode::leaf(item.id),
                comments: Vec::new(),
            }
        };
        if conversation.root.kids.len() < item.kids.len() {
            warn!(
                id,
                hydrated = conversation.root.kids.len(),
                expected = item.kids.len(),
                "some direct replies could not be hydrated"
            );
        }

        let mut comments = conversation.comments;
        comments.sort_by_key(|c| c.time);

        Ok(ItemThread {
            item,
            conversation: conversation.root,
            comments,
        })
    }

    /// The first `limit` top stories, best first.
    pub async fn top_items(&self, ctx: &Context, limit: usize) -> Result<Vec<Item>> {
        let ids = tokio::select! {
            biased;
            _ = ctx.done() => {
                return Err(ctx.err().unwrap_or(HuginnError::Cancelled));
            }
            ids = self.feed.top_story_ids() => ids?,
        };
        let ids: Vec<ItemId> = ids.into_iter().take(limit).collect();
        info!(count = ids.len(), "hydrating top stories");
        Ok(self.repository.get(ctx, &ids).await)
    }
}
