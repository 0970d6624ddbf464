//! Upstream item sources.
//!
//! [`FirebaseClient`] talks to the real API; [`RetryingItemSource`] adds
//! retries around any [`ItemSource`].

pub mod firebase;
pub mod retry;
pub mod traits;

pub use firebase::FirebaseClient;
pub use retry::{RetryConfig, RetryingItemSource};
pub use traits::{FeedSource, ItemSource};
