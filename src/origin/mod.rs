//! Origins: the backend's canonical URL and the shim's public identity.
//!
//! Both are plain `scheme://host[:port]` strings. The rewriter substitutes one
//! for the other textually, so they are normalized once here.

pub mod resolver;

use thiserror::Error;
use url::Url;

pub use resolver::{DomainResolver, ResolveError, PRIMARY_DOMAIN_QUERY};

/// Why a string is not a usable origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    #[error("invalid URL '{0}': {1}")]
    Parse(String, String),

    #[error("unsupported scheme '{0}'")]
    Scheme(String),

    #[error("URL '{0}' has no host")]
    MissingHost(String),

    #[error("URL '{0}' must not carry a path, query or fragment")]
    NotAnOrigin(String),
}

/// Normalize `raw` to `scheme://host[:port]`.
///
/// A single trailing slash is tolerated; any other path is rejected.
pub fn normalize_origin(raw: &str) -> Result<String, OriginError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| OriginError::Parse(trimmed.to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(OriginError::Scheme(other.to_string())),
    }
    if url.host_str().is_none() {
        return Err(OriginError::MissingHost(trimmed.to_string()));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(OriginError::NotAnOrigin(trimmed.to_string()));
    }

    Ok(url.origin().ascii_serialization())
}

/// The backend's canonical absolute URL: scheme and host, no trailing path.
///
/// Requests go to the normalized form; page rewriting matches the URL as
/// the backend reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedOrigin {
    backend_url: String,
    literal: String,
}

impl ResolvedOrigin {
    /// Validate and normalize a backend URL.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let backend_url = normalize_origin(raw)?;
        let trimmed = raw.trim();
        let literal = trimmed.strip_suffix('/').unwrap_or(trimmed).to_string();
        Ok(Self { backend_url, literal })
    }

    /// The normalized backend URL.
    pub fn as_str(&self) -> &str {
        &self.backend_url
    }

    /// The backend URL as reported, minus a trailing `/`. Case and
    /// non-ASCII hosts are kept.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Absolute backend URL for a request's `pathname + search`.
    pub fn target(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.backend_url, path_and_query)
        } else {
            format!("{}/{}", self.backend_url, path_and_query)
        }
    }
}

impl std::fmt::Display for ResolvedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.backend_url)
    }
}
