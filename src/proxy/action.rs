//! Write path: forward mutating requests and relay the backend's answer.

use axum::response::Response;

use crate::http::request::{IncomingRequest, OutgoingRequest};
use crate::http::response::{json_error_response, relay};
use crate::observability::metrics;
use crate::origin::ResolvedOrigin;

/// Forwards a request to the backend without touching the response.
#[derive(Debug)]
pub struct ActionForwarder<'a> {
    client: &'a reqwest::Client,
    body_limit: usize,
}

impl<'a> ActionForwarder<'a> {
    pub fn new(client: &'a reqwest::Client, body_limit: usize) -> Self {
        Self { client, body_limit }
    }

    /// Forward and relay. Redirects come back as-is; any failure becomes a
    /// 500 with `{"error": message}`.
    pub async fn forward(&self, incoming: IncomingRequest, backend: &ResolvedOrigin) -> Response {
        let method = incoming.method.clone();
        let path = incoming.path_and_query.clone();

        let result = match OutgoingRequest::build(incoming, backend, self.body_limit).await {
            Ok(outgoing) => outgoing.send(self.client).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(upstream) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    status = upstream.status().as_u16(),
                    "Forwarded action"
                );
                relay(upstream)
            }
            Err(message) => {
                metrics::record_forward_failure();
                tracing::warn!(
                    method = %method,
                    path = %path,
                    backend = %backend,
                    error = %message,
                    "Action forward failed"
                );
                json_error_response(&message)
            }
        }
    }
}
