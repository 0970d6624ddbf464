//! Huginn - read-through cache and concurrent fetcher for Hacker News items
//!
//! Huginn resolves item ids against the Hacker News item API, keeps the
//! results in a TTL cache, and assembles nested reply trees. The pieces:
//!
//! - [`BoundedFetcher`] fans a batch of ids out to an [`ItemSource`] with a
//!   per-instance concurrency limit and a caller deadline.
//! - [`CachedItemRepository`] serves ids from a [`CacheStore`], fetches the
//!   misses, writes them back, and returns items in request order.
//! - [`ConversationBuilder`] walks reply ids level by level through the
//!   repository and rebuilds the tree in upstream order.
//! - [`Gateway`] wires it all together; build one with [`Huginn::builder()`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use huginn::{Context, Huginn};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let gateway = Huginn::builder().max_concurrent(32).build()?;
//!
//!     let ctx = Context::background().with_timeout(Duration::from_secs(5));
//!     let thread = gateway.item_thread(&ctx, 8863).await?;
//!
//!     println!("{} comments", thread.comments.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod providers;
pub mod repository;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStore, MemoryCacheStore};
pub use context::Context;
pub use conversation::{ConversationBuilder, ConversationConfig};
pub use error::{HuginnError, Result};
pub use fetch::{BoundedFetcher, FetchOutcome, FetcherConfig};
pub use gateway::{Gateway, Huginn, HuginnBuilder};
pub use providers::{FeedSource, FirebaseClient, ItemSource, RetryConfig, RetryingItemSource};
pub use repository::{CachedItemRepository, ItemRepository, RepositoryConfig};
pub use types::{Conversation, ConversationNode, Item, ItemId, ItemKind, ItemThread};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
