//! File-based configuration.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. explicit path (e.g. `--config <path>`), which must exist
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! With no file found, built-in defaults apply. Every key is optional.
//!
//! ```toml
//! [upstream]
//! base_url = "https://hacker-news.firebaseio.com"
//! request_timeout_secs = 10
//! max_concurrent = 32
//!
//! [cache]
//! max_entries = 10000
//! item_ttl_secs = 60
//!
//! [conversation]
//! max_depth = 64
//!
//! [retry]
//! max_attempts = 3
//!
//! [limits]
//! request_deadline_secs = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::conversation::DEFAULT_MAX_DEPTH;
use crate::fetch::DEFAULT_MAX_CONCURRENT;
use crate::gateway::HuginnBuilder;
use crate::providers::RetryConfig;
use crate::providers::firebase::DEFAULT_BASE_URL;
use crate::{Huginn, HuginnError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub conversation: ConversationSection,
    /// Retries are off unless this section is present.
    #[serde(default)]
    pub retry: Option<RetrySection>,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum concurrent upstream calls (default: 32).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Capacity of the in-memory store (default: 10,000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// TTL for cached items in seconds (default: 60).
    #[serde(default = "default_item_ttl")]
    pub item_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            item_ttl_secs: default_item_ttl(),
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_item_ttl() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSection {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ConversationSection {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Retry settings for transient upstream failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl From<RetrySection> for RetryConfig {
    fn from(section: RetrySection) -> Self {
        RetryConfig::new()
            .max_attempts(section.max_attempts)
            .initial_delay(Duration::from_millis(section.initial_delay_ms))
            .max_delay(Duration::from_millis(section.max_delay_ms))
    }
}

/// Per-call limits applied by callers such as the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Overall deadline for one lookup in seconds (default: 5).
    #[serde(default = "default_deadline")]
    pub request_deadline_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_deadline_secs: default_deadline(),
        }
    }
}

fn default_deadline() -> u64 {
    5
}

impl Config {
    /// Load configuration from the standard locations, falling back to
    /// defaults when no file exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Deadline for a single lookup.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.limits.request_deadline_secs)
    }

    /// A gateway builder preloaded with these settings.
    pub fn builder(&self) -> HuginnBuilder {
        let mut builder = Huginn::builder()
            .base_url(&self.upstream.base_url)
            .request_timeout(Duration::from_secs(self.upstream.request_timeout_secs))
            .max_concurrent(self.upstream.max_concurrent)
            .cache_config(CacheConfig::new().max_entries(self.cache.max_entries))
            .item_ttl(Duration::from_secs(self.cache.item_ttl_secs))
            .max_depth(self.conversation.max_depth);
        if let Some(retry) = self.retry.clone() {
            builder = builder.retry(retry.into());
        }
        builder
    }
}
