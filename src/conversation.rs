//! Recursive reply-tree assembly.
//!
//! [`ConversationBuilder::build_conversation`] hydrates every descendant of
//! a root item through an [`ItemRepository`] and returns a fresh tree plus
//! the flat list of hydrated comments. Each level is resolved with one
//! repository call; sibling subtrees are built concurrently and then put
//! back into the parent's `kids` order explicitly, since completion order
//! is arbitrary.
//!
//! Upstream data is trusted to be a tree, but two guards keep pathological
//! input bounded: a maximum depth, and a check that skips any child whose
//! id already appears on the path from the root.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, join_all};
use tracing::warn;

use crate::context::Context;
use crate::repository::ItemRepository;
use crate::types::{Conversation, ConversationNode, Item, ItemId};

/// Default maximum reply depth below the root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for [`ConversationBuilder`].
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Deepest level hydrated below the root (direct replies are level 1).
    /// Default: 64.
    pub max_depth: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConversationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Nodes and hydrated items of one tree level (and everything below it).
#[derive(Default)]
struct Level {
    nodes: Vec<ConversationNode>,
    comments: Vec<Item>,
}

/// Builds reply trees on top of an [`ItemRepository`].
#[derive(Clone)]
pub struct ConversationBuilder {
    repository: Arc<dyn ItemRepository>,
    max_depth: usize,
}

impl ConversationBuilder {
    pub fn new(repository: Arc<dyn ItemRepository>, config: &ConversationConfig) -> Self {
        Self {
            repository,
            max_depth: config.max_depth,
        }
    }

    /// Build the reply tree under `root_id`, whose direct replies are
    /// `child_ids`.
    ///
    /// Children that fail to resolve are absent from both the tree and the
    /// flat comment list.
    pub async fn build_conversation(
        &self,
        ctx: &Context,
        root_id: ItemId,
        child_ids: &[ItemId],
    ) -> Conversation {
        let level = self.build_level(ctx, child_ids, vec![root_id], 1).await;
        Conversation {
            root: ConversationNode {
                id: root_id,
                kids: level.nodes,
            },
            comments: level.comments,
        }
    }

    fn build_level<'a>(
        &'a self,
        ctx: &'a Context,
        child_ids: &'a [ItemId],
        path: Vec<ItemId>,
        depth: usize,
    ) -> BoxFuture<'a, Level> {
        async move {
            if child_ids.is_empty() {
                return Level::default();
            }
            if depth > self.max_depth {
                warn!(
                    parent = path.last().copied(),
                    depth,
                    skipped = child_ids.len(),
                    "conversation depth limit reached"
                );
                return Level::default();
            }

            let items: Vec<Item> = self
                .repository
                .get(ctx, child_ids)
                .await
                .into_iter()
                .filter(|item| {
                    let cyclic = path.contains(&item.id);
                    if cyclic {
                        warn!(id = item.id, ?path, "reply refers back to an ancestor, skipping");
                    }
                    !cyclic
                })
                .collect();

            let subtrees = join_all(items.iter().map(|item| {
                let mut child_path = path.clone();
                child_path.push(item.id);
                self.build_level(ctx, &item.kids, child_path, depth + 1)
            }))
            .await;

            let mut level = Level::default();
            for (item, subtree) in items.into_iter().zip(subtrees) {
                level.nodes.push(ConversationNode {
                    id: item.id,
                    kids: subtree.nodes,
                });
                level.comments.push(item);
                level.comments.extend(subtree.comments);
            }
            sort_by_request(&mut level.nodes, child_ids);
            level
        }
        .boxed()
    }
}

/// Put `nodes` into the order their ids appear in `order`.
fn sort_by_request(nodes: &mut [ConversationNode], order: &[ItemId]) {
    let mut position = HashMap::with_capacity(order.len());
    for (i, id) in order.iter().enumerate() {
        position.entry(*id).or_insert(i);
    }
    nodes.sort_by_key(|node| position.get(&node.id).copied().unwrap_or(usize::MAX));
}
