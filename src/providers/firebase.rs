//! Client for the Hacker News Firebase API.
//!
//! See: <https://github.com/HackerNews/API>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::traits::{FeedSource, ItemSource};
use crate::types::{Item, ItemId};
use crate::{HuginnError, Result};

/// Default base URL for the Hacker News API
pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for `/v0/item/<id>.json` and `/v0/topstories.json`.
///
/// Every request carries its own timeout, independent of any caller
/// deadline.
#[derive(Clone)]
pub struct FirebaseClient {
    http: Client,
    base_url: String,
}

impl FirebaseClient {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a single item.
    pub fn item_url(&self, id: ItemId) -> String {
        format!("{}/v0/item/{id}.json", self.base_url)
    }

    /// URL of the top stories list.
    pub fn top_stories_url(&self) -> String {
        format!("{}/v0/topstories.json", self.base_url)
    }

    async fn get(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(HuginnError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parse an item payload. `null` and empty bodies mean the item does not
/// exist; an item carrying a different id is rejected.
pub(crate) fn parse_item(id: ItemId, body: &str) -> Result<Item> {
    let body = body.trim();
    if body.is_empty() {
        return Err(HuginnError::NotFound(id));
    }
    let item: Option<Item> = serde_json::from_str(body)?;
    let item = item.ok_or(HuginnError::NotFound(id))?;
    if item.id != id {
        return Err(HuginnError::Malformed(format!(
            "requested item {id}, upstream returned {}",
            item.id
        )));
    }
    Ok(item)
}

#[async_trait]
impl ItemSource for FirebaseClient {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Item> {
        let url = self.item_url(id);
        debug!(id, %url, "fetching item");
        let body = self.get(&url).await?;
        parse_item(id, &body)
    }
}

#[async_trait]
impl FeedSource for FirebaseClient {
    async fn top_story_ids(&self) -> Result<Vec<ItemId>> {
        let body = self.get(&self.top_stories_url()).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
