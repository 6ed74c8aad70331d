//! Storefront query types and error definitions.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// How long a query result may be served from the client's cache.
///
/// Presets mirror the storefront SDK's `CacheShort` / `CacheLong` strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always query the API.
    NoStore,
    /// Fresh for 1s, served stale for another 9s.
    Short,
    /// Fresh for 1h, served stale for another 23h.
    Long,
    /// Explicit windows.
    Custom {
        max_age: Duration,
        stale_while_revalidate: Duration,
    },
}

impl CachePolicy {
    /// Window during which a stored result is fresh.
    pub fn max_age(&self) -> Duration {
        match self {
            CachePolicy::NoStore => Duration::ZERO,
            CachePolicy::Short => Duration::from_secs(1),
            CachePolicy::Long => Duration::from_secs(3600),
            CachePolicy::Custom { max_age, .. } => *max_age,
        }
    }

    /// Extra window after `max_age` during which a stale result is served
    /// while a refresh runs in the background.
    pub fn stale_while_revalidate(&self) -> Duration {
        match self {
            CachePolicy::NoStore => Duration::ZERO,
            CachePolicy::Short => Duration::from_secs(9),
            CachePolicy::Long => Duration::from_secs(82_800),
            CachePolicy::Custom {
                stale_while_revalidate,
                ..
            } => *stale_while_revalidate,
        }
    }

    /// Whether results may be stored at all.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, CachePolicy::NoStore)
            && !(self.max_age().is_zero() && self.stale_while_revalidate().is_zero())
    }
}

/// Errors that can occur while querying the storefront API.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Connection, TLS or body decoding failure.
    #[error("storefront request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured access token cannot be sent as a header.
    #[error("storefront access token is not a valid header value")]
    InvalidToken,

    /// The API answered with a non-success status.
    #[error("storefront returned HTTP {0}")]
    Status(u16),

    /// The API answered with GraphQL errors.
    #[error("storefront query failed: {0}")]
    GraphQl(String),

    /// The response carried neither errors nor data.
    #[error("storefront response had no data")]
    MissingData,

    /// The data did not have the expected shape.
    #[error("unexpected storefront response shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Result type for storefront operations.
pub type StorefrontResult<T> = Result<T, StorefrontError>;

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

impl GraphQlResponse {
    /// Collapse the envelope into data or an error.
    pub fn into_data(self) -> StorefrontResult<serde_json::Value> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(StorefrontError::GraphQl(messages.join("; ")));
        }
        match self.data {
            Some(serde_json::Value::Null) | None => Err(StorefrontError::MissingData),
            Some(data) => Ok(data),
        }
    }
}
