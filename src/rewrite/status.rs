//! Soft-404 detection.
//!
//! The backend may answer a missing page with 200 and a "404 Not Found"
//! title. The title text decides the status handed back to the client.

use std::sync::OnceLock;

use axum::http::StatusCode;
use regex::Regex;

static SOFT_404_PATTERN: &str = r"(?is)<title>.*404 Not Found.*</title>";

static SOFT_404: OnceLock<Regex> = OnceLock::new();

/// True when a `<title>` element says "404 Not Found", in any case, across lines.
pub fn is_soft_404(body: &str) -> bool {
    SOFT_404
        .get_or_init(|| Regex::new(SOFT_404_PATTERN).expect("soft-404 pattern is valid"))
        .is_match(body)
}

/// The status to return for a backend response with this raw body.
pub fn corrected_status(body: &str, backend_status: StatusCode) -> StatusCode {
    if is_soft_404(body) {
        StatusCode::NOT_FOUND
    } else {
        backend_status
    }
}
