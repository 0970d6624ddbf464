//! Nested reply trees

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId};

/// One node of a reply tree.
///
/// Children follow the parent item's `kids` order, not the order in which
/// they were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationNode {
    pub id: ItemId,
    pub kids: Vec<ConversationNode>,
}

impl ConversationNode {
    /// Create a leaf node.
    pub fn leaf(id: ItemId) -> Self {
        Self {
            id,
            kids: Vec::new(),
        }
    }

    /// Ids of the direct children, in order.
    pub fn kid_ids(&self) -> Vec<ItemId> {
        self.kids.iter().map(|k| k.id).collect()
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.kids.iter().map(|k| 1 + k.descendant_count()).sum()
    }

    /// Number of levels below this one (0 for a leaf).
    pub fn depth(&self) -> usize {
        self.kids.iter().map(|k| 1 + k.depth()).max().unwrap_or(0)
    }
}

/// A reply tree together with every item hydrated while building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub root: ConversationNode,
    /// Flat list of hydrated descendants, in tree pre-order.
    pub comments: Vec<Item>,
}

/// A single item with its full discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemThread {
    pub item: Item,
    pub conversation: ConversationNode,
    /// Every hydrated comment, oldest first.
    pub comments: Vec<Item>,
}
