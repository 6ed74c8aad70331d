//! Backend domain resolution.
//!
//! Every request asks the storefront for its primary domain. The resolver
//! never caches; the query runs under `CachePolicy::Long` and the storefront
//! client decides when the API is actually hit.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::origin::{OriginError, ResolvedOrigin};
use crate::storefront::{CachePolicy, StorefrontError, StorefrontQuery};

/// Query for the shop's canonical public URL.
pub const PRIMARY_DOMAIN_QUERY: &str = r#"query {
  shop {
    primaryDomain {
      url
    }
  }
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryDomainData {
    shop: Shop,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Shop {
    primary_domain: PrimaryDomain,
}

#[derive(Debug, Deserialize)]
struct PrimaryDomain {
    url: String,
}

/// Errors raised while resolving the backend origin.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Query(#[from] StorefrontError),

    #[error("primary domain is not a valid origin: {0}")]
    Origin(#[from] OriginError),
}

/// Resolves the backend's canonical URL through a storefront query.
#[derive(Clone)]
pub struct DomainResolver {
    storefront: Arc<dyn StorefrontQuery>,
}

impl DomainResolver {
    pub fn new(storefront: Arc<dyn StorefrontQuery>) -> Self {
        Self { storefront }
    }

    /// Ask the backend for its primary domain URL.
    pub async fn resolve(&self) -> Result<ResolvedOrigin, ResolveError> {
        let result = self.query_primary_domain().await;
        metrics::record_origin_resolution(result.is_ok());
        result
    }

    async fn query_primary_domain(&self) -> Result<ResolvedOrigin, ResolveError> {
        let data = self
            .storefront
            .query(PRIMARY_DOMAIN_QUERY, CachePolicy::Long)
            .await?;
        let parsed: PrimaryDomainData = serde_json::from_value(data).map_err(StorefrontError::from)?;
        Ok(ResolvedOrigin::parse(&parsed.shop.primary_domain.url)?)
    }
}

impl std::fmt::Debug for DomainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainResolver").finish_non_exhaustive()
    }
}
