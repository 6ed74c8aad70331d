//! Request handling and transformation.
//!
//! # Responsibilities
//! - Decompose the incoming request into proxy origin and path to forward
//! - Rebuild it against the resolved backend origin
//! - Buffer the body within the configured limit
//!
//! # Design Decisions
//! - The outgoing request takes the resolved origin as input; it cannot be
//!   built before resolution finished
//! - Redirects are never followed (the shared client is built that way)

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, Uri};
use http_body_util::LengthLimitError;

use crate::http::headers::outgoing_headers;
use crate::http::response::ProxyError;
use crate::origin::{normalize_origin, ResolvedOrigin};

/// Which pipeline a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// GET/HEAD: fetch, rewrite, sanitize.
    Read,
    /// Everything else: forward and relay unchanged.
    Write,
}

impl PathKind {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD {
            PathKind::Read
        } else {
            PathKind::Write
        }
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Read => "read",
            PathKind::Write => "write",
        }
    }
}

/// The request as received, split into the shim's own origin and the
/// `pathname + search` to forward.
#[derive(Debug)]
pub struct IncomingRequest {
    pub method: Method,
    pub origin: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Body,
}

impl IncomingRequest {
    /// Decompose an axum request.
    ///
    /// `public_origin` (already normalized) wins over anything derived from
    /// the request.
    pub fn from_request(
        request: Request<Body>,
        public_origin: Option<&str>,
        trust_forwarded: bool,
    ) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();

        let origin = match public_origin {
            Some(origin) => origin.to_string(),
            None => derive_origin(&parts.headers, &parts.uri, trust_forwarded).ok_or(ProxyError::MissingHost)?,
        };
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            method: parts.method,
            origin,
            path_and_query,
            headers: parts.headers,
            body,
        })
    }

    pub fn kind(&self) -> PathKind {
        PathKind::for_method(&self.method)
    }
}

/// Origin the client used to reach the shim.
///
/// Host from `Host`, else the URI authority; scheme from the URI, else http.
/// With `trust_forwarded`, `X-Forwarded-Host` and `X-Forwarded-Proto` take
/// precedence.
pub fn derive_origin(headers: &HeaderMap, uri: &Uri, trust_forwarded: bool) -> Option<String> {
    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let forwarded = |name: &str| if trust_forwarded { first_value(name) } else { None };

    let scheme = forwarded("x-forwarded-proto")
        .map(|s| s.to_ascii_lowercase())
        .or_else(|| uri.scheme_str().map(str::to_ascii_lowercase));
    let scheme = match scheme.as_deref() {
        Some("https") => "https",
        _ => "http",
    };
    let host = forwarded("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))?;

    normalize_origin(&format!("{}://{}", scheme, host)).ok()
}

/// The request to send to the backend.
#[derive(Debug)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutgoingRequest {
    /// Target `backend_url + pathname + search` with method, headers and body
    /// of the incoming request.
    pub async fn build(
        incoming: IncomingRequest,
        origin: &ResolvedOrigin,
        body_limit: usize,
    ) -> Result<Self, ProxyError> {
        let body = read_body(incoming.body, body_limit).await?;
        Ok(Self {
            url: origin.target(&incoming.path_and_query),
            headers: outgoing_headers(&incoming.headers),
            method: incoming.method,
            body,
        })
    }

    /// Send with the shared client. An empty body is not attached so GETs
    /// don't grow a `content-length: 0`.
    pub async fn send(self, client: &reqwest::Client) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = client.request(self.method, &self.url).headers(self.headers);
        if !self.body.is_empty() {
            builder = builder.body(self.body);
        }
        builder.send().await
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_limit(&e) {
            ProxyError::BodyTooLarge(limit)
        } else {
            ProxyError::Body(e)
        }
    })
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
