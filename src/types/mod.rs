//! Public types for the Huginn API.

mod conversation;
mod item;

pub use conversation::{Conversation, ConversationNode, ItemThread};
pub use item::{Item, ItemId, ItemKind};
