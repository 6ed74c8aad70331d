//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay backend responses to the client (write path)
//! - Map pipeline errors to HTTP status codes
//! - Build the JSON error body for failed forwards
//!
//! # Design Decisions
//! - Relayed bodies are streamed, never buffered
//! - Hop-by-hop headers stripped automatically
//! - Resolution failures surface as a generic 500

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::headers::strip_hop_by_hop;
use crate::origin::ResolveError;

/// Errors that end a request before a backend response exists.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No public origin configured and none derivable from the request.
    #[error("could not determine the request's public origin")]
    MissingHost,

    /// The backend's primary domain could not be resolved.
    #[error("failed to resolve backend origin: {0}")]
    Resolve(#[from] ResolveError),

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(axum::Error),

    /// The request body exceeded the configured limit.
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// The backend could not be reached or its body could not be read.
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingHost | ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

/// `500` with body `{"error": "<message>"}` and no other headers.
pub fn json_error_response(message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Pass a backend response through unchanged, streaming the body.
pub fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
