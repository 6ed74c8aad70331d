//! Read path: fetch a page from the backend and rewrite it for the proxy origin.
//!
//! # Responsibilities
//! - Fetch without following redirects
//! - Correct soft-404 statuses from the raw body
//! - Rewrite the body and sanitize its headers
//!
//! # Design Decisions
//! - The body is buffered; rewriting needs all of it
//! - Compression is negotiated by the HTTP client so the body arrives decoded
//! - Fetch failures propagate to the caller

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::RewriteConfig;
use crate::http::headers::sanitize_rewritten;
use crate::http::request::{IncomingRequest, OutgoingRequest};
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::origin::ResolvedOrigin;
use crate::rewrite::{corrected_status, ContentRewriter, RewriteStats};

/// A buffered backend response.
#[derive(Debug)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_text: String,
}

impl BackendResponse {
    pub async fn fetch(
        client: &reqwest::Client,
        incoming: IncomingRequest,
        backend: &ResolvedOrigin,
        body_limit: usize,
    ) -> Result<Self, ProxyError> {
        let mut outgoing = OutgoingRequest::build(incoming, backend, body_limit).await?;
        outgoing.headers.remove(header::ACCEPT_ENCODING);

        let upstream = outgoing.send(client).await?;
        let status = upstream.status();
        let headers = upstream.headers().clone();
        let body_text = upstream.text().await?;

        Ok(Self {
            status,
            headers,
            body_text,
        })
    }

    /// Apply soft-404 correction, body rewriting and header sanitizing.
    pub fn rewrite(self, options: RewriteConfig, backend_origin: &str, proxy_origin: &str) -> RewrittenResponse {
        let status = corrected_status(&self.body_text, self.status);
        if status != self.status {
            metrics::record_soft_404();
            tracing::debug!(backend_status = self.status.as_u16(), "Soft 404 detected");
        }

        let rewritten = ContentRewriter::new(options, backend_origin, proxy_origin).rewrite(&self.body_text);
        metrics::record_rewrites(&rewritten.stats);
        if !rewritten.stats.is_empty() {
            tracing::debug!(stats = ?rewritten.stats, "Rewrote backend body");
        }

        let mut headers = self.headers;
        sanitize_rewritten(&mut headers);

        RewrittenResponse {
            status,
            headers,
            body: rewritten.body,
            stats: rewritten.stats,
        }
    }
}

/// The response handed back to the client on the read path.
#[derive(Debug)]
pub struct RewrittenResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub stats: RewriteStats,
}

impl IntoResponse for RewrittenResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
