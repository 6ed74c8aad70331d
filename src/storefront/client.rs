//! Storefront GraphQL client with policy-driven caching.
//!
//! # Responsibilities
//! - POST queries to the storefront GraphQL endpoint
//! - Serve results from the query cache according to the caller's policy
//! - Refresh stale entries in the background

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::config::StorefrontConfig;
use crate::storefront::cache::{Lookup, QueryCache};
use crate::storefront::types::{CachePolicy, GraphQlResponse, StorefrontError, StorefrontResult};

/// Header carrying the public Storefront API token.
pub const STOREFRONT_TOKEN_HEADER: &str = "x-shopify-storefront-access-token";

/// Capability to run a storefront query under a cache policy.
///
/// Returns the `data` member of the GraphQL response.
#[async_trait]
pub trait StorefrontQuery: Send + Sync {
    async fn query(&self, query: &str, cache: CachePolicy) -> StorefrontResult<Value>;
}

/// Storefront API client.
#[derive(Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    endpoint: String,
    cache: QueryCache,
}

impl StorefrontClient {
    /// Create a client for the configured store.
    pub fn new(config: &StorefrontConfig) -> StorefrontResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.public_access_token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| StorefrontError::InvalidToken)?;
            headers.insert(STOREFRONT_TOKEN_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let endpoint = config.endpoint();
        tracing::info!(endpoint = %endpoint, "Storefront client initialized");

        Ok(Self {
            http,
            endpoint,
            cache: QueryCache::new(),
        })
    }

    /// GraphQL endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of cached query results.
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    /// Run a query against the API, bypassing the cache.
    async fn execute(&self, query: &str) -> StorefrontResult<Value> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": {} }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorefrontError::Status(status.as_u16()));
        }

        let envelope: GraphQlResponse = response.json().await?;
        envelope.into_data()
    }

    fn spawn_refresh(&self, query: &str) {
        let client = self.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            match client.execute(&query).await {
                Ok(data) => {
                    client.cache.store(&query, data, Instant::now());
                    tracing::debug!("Storefront query refreshed in background");
                }
                Err(e) => {
                    client.cache.release(&query);
                    tracing::warn!(error = %e, "Background storefront refresh failed, serving stale data");
                }
            }
        });
    }
}

#[async_trait]
impl StorefrontQuery for StorefrontClient {
    async fn query(&self, query: &str, cache: CachePolicy) -> StorefrontResult<Value> {
        match self.cache.lookup(query, cache, Instant::now()) {
            Lookup::Fresh(data) => Ok(data),
            Lookup::Stale { data, refresh } => {
                if refresh {
                    self.spawn_refresh(query);
                }
                Ok(data)
            }
            Lookup::Miss => {
                let data = self.execute(query).await?;
                if cache.is_cacheable() {
                    self.cache.store(query, data.clone(), Instant::now());
                }
                Ok(data)
            }
        }
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.endpoint)
            .field("cached_queries", &self.cache.len())
            .finish()
    }
}
