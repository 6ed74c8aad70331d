//! Header rules for forwarded requests and returned responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop headers the HTTP client derives itself (host, content-length)
//! - Sanitize headers of rewritten HTML responses

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Cache policy for rewritten bodies: they differ per request, so the
/// backend's own caching headers no longer apply.
pub const REWRITTEN_CACHE_CONTROL: &str = "public, max-age=1, must-revalidate=9";

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Headers to send upstream: everything the client sent except transport
/// headers the HTTP client sets from the target URL and body.
pub fn outgoing_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

/// Headers safe to return with a rewritten body.
///
/// Order: content-type forced to `text/html`, content-encoding removed,
/// cache-control replaced. The body length changed, so content-length goes too.
pub fn sanitize_rewritten(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers.remove(header::CONTENT_ENCODING);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(REWRITTEN_CACHE_CONTROL));
    headers.remove(header::CONTENT_LENGTH);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=600"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("1234"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("cart=abc; Path=/"));
        headers.insert("x-shopid", HeaderValue::from_static("42"));
        headers
    }

    #[test]
    fn test_sanitize_rewritten() {
        let mut headers = backend_headers();
        sanitize_rewritten(&mut headers);

        assert_eq!(headers[header::CONTENT_TYPE], "text/html");
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=1, must-revalidate=9");
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        // everything else passes through
        assert_eq!(headers[header::SET_COOKIE], "cart=abc; Path=/");
        assert_eq!(headers["x-shopid"], "42");
    }

    #[test]
    fn test_sanitize_sets_headers_when_absent() {
        let mut headers = HeaderMap::new();
        sanitize_rewritten(&mut headers);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html");
        assert_eq!(headers[header::CACHE_CONTROL], REWRITTEN_CACHE_CONTROL);
    }

    #[test]
    fn test_strip_hop_by_hop_honors_connection_list() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-debug"));
        headers.insert("x-debug", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));

        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "text/html");
    }

    #[test]
    fn test_outgoing_headers_drop_host_and_length() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("www.example.com"));
        incoming.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        incoming.insert(header::COOKIE, HeaderValue::from_static("session=1"));
        incoming.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));

        let out = outgoing_headers(&incoming);
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(out[header::COOKIE], "session=1");
        assert_eq!(out[header::CONTENT_TYPE], "application/x-www-form-urlencoded");
    }
}
