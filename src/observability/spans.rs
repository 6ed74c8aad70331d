//! Per-request spans.
//!
//! The request ID is assigned before the trace layer runs, so every event
//! logged while handling a request carries it.

use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

use crate::http::request_id::X_REQUEST_ID;

/// Builds the `request` span for the trace layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}
