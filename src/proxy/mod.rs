//! Request pipeline: resolve the backend, then take the read or write path.
//!
//! # Data Flow
//! ```text
//! IncomingRequest
//!     → DomainResolver (backend origin, every request)
//!     → GET/HEAD: content.rs (fetch, soft-404, rewrite, sanitize headers)
//!     → other:    action.rs (forward, relay unchanged, JSON 500 on failure)
//! ```
//!
//! # Design Decisions
//! - Resolution happens before anything is sent; the outgoing request needs
//!   its result
//! - One shared HTTP client per pipeline, redirects never followed
//! - No retries

pub mod action;
pub mod content;

use std::sync::Arc;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use reqwest::redirect::Policy;

use crate::config::{RewriteConfig, ShimConfig, TimeoutConfig};
use crate::http::request::{IncomingRequest, PathKind};
use crate::http::response::ProxyError;
use crate::origin::DomainResolver;
use crate::storefront::StorefrontQuery;

pub use action::ActionForwarder;
pub use content::{BackendResponse, RewrittenResponse};

/// HTTP client used for backend traffic.
///
/// Redirects are handed back to the caller as-is (manual redirect mode).
pub fn build_http_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .build()
}

/// Everything needed to serve one request.
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: reqwest::Client,
    resolver: DomainResolver,
    rewrite: RewriteConfig,
    body_limit: usize,
}

impl Pipeline {
    pub fn new(config: &ShimConfig, storefront: Arc<dyn StorefrontQuery>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(&config.timeouts)?,
            resolver: DomainResolver::new(storefront),
            rewrite: config.rewrite,
            body_limit: config.security.max_body_size,
        })
    }

    pub fn rewrite_options(&self) -> RewriteConfig {
        self.rewrite
    }

    /// Serve a request end to end.
    ///
    /// Errors are resolution failures and read-path fetch failures; the
    /// write path never fails.
    pub async fn handle(&self, incoming: IncomingRequest) -> Result<Response, ProxyError> {
        let backend = self.resolver.resolve().await?;
        tracing::debug!(
            backend = %backend,
            proxy = %incoming.origin,
            path = %incoming.path_and_query,
            "Resolved backend origin"
        );

        match incoming.kind() {
            PathKind::Write => {
                let forwarder = ActionForwarder::new(&self.client, self.body_limit);
                Ok(forwarder.forward(incoming, &backend).await)
            }
            PathKind::Read => {
                let proxy_origin = incoming.origin.clone();
                let fetched = BackendResponse::fetch(&self.client, incoming, &backend, self.body_limit).await?;
                let rewritten = fetched.rewrite(self.rewrite, backend.literal(), &proxy_origin);
                Ok(rewritten.into_response())
            }
        }
    }
}
