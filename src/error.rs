//! Huginn error types

use crate::types::ItemId;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered with `null` or an empty body.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("malformed item: {0}")]
    Malformed(String),

    // Context errors
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    // Cache errors
    #[error("cache error: {0}")]
    Cache(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl HuginnError {
    /// Whether this error came from the caller's context being cancelled or
    /// running past its deadline.
    ///
    /// Callers can use this to decide whether to retry a whole call.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether a fresh attempt at the same request might succeed.
    ///
    /// Transport failures, timeouts, rate limiting and 5xx responses are
    /// transient. Decode failures, missing items and context errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HuginnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HuginnError::Timeout
        } else {
            HuginnError::Http(err.to_string())
        }
    }
}

impl From<bincode::Error> for HuginnError {
    fn from(err: bincode::Error) -> Self {
        HuginnError::Cache(err.to_string())
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
