//! Rewrite rules and the combined pattern that finds their targets.
//!
//! One regex alternation covers all four targets so the body is scanned once.
//! Each match is classified by its literal prefix and handed to the rule for
//! that class.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::RewriteConfig;
use crate::rewrite::rewriter::RewriteStats;

/// Robots noindex meta tag, canonical link tag, analytics region marker,
/// inline script block. Case-insensitive; tags do not span `>`; scripts are
/// lazy and may span lines.
static COMBINED_PATTERN: &str = concat!(
    r#"(?i)<meta[^>]*name="robots"[^>]*content="[^"]*noindex[^"]*"[^>]*>"#,
    r#"|<link[^>]*rel="canonical"[^>]*href="[^"]*"[^>]*>"#,
    r#"|"monorailRegion":"shop_domain""#,
    r#"|<script\b(?s:.)*?</script>"#,
);

static LOCATION_REPLACE_PATTERN: &str = r"window\.location\.replace\([^)]*\);?";

/// The marker alone, matched with the same case rules as the combined pattern.
static REGION_MARKER_PATTERN: &str = r#"(?i)"monorailRegion":"shop_domain""#;

static COMBINED: OnceLock<Regex> = OnceLock::new();
static LOCATION_REPLACE: OnceLock<Regex> = OnceLock::new();
static REGION_MARKER: OnceLock<Regex> = OnceLock::new();

/// Analytics region value only valid on the backend's own domain.
pub const SHOP_DOMAIN_REGION_MARKER: &str = r#""monorailRegion":"shop_domain""#;

/// Replacement for the analytics region marker.
pub const GLOBAL_REGION_MARKER: &str = r#""monorailRegion":"global""#;

pub(crate) fn combined() -> &'static Regex {
    COMBINED.get_or_init(|| Regex::new(COMBINED_PATTERN).expect("combined rewrite pattern is valid"))
}

fn location_replace() -> &'static Regex {
    LOCATION_REPLACE
        .get_or_init(|| Regex::new(LOCATION_REPLACE_PATTERN).expect("location.replace pattern is valid"))
}

fn region_marker() -> &'static Regex {
    REGION_MARKER.get_or_init(|| Regex::new(REGION_MARKER_PATTERN).expect("region marker pattern is valid"))
}

/// Which rule a combined-pattern match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Meta,
    Link,
    AnalyticsMarker,
    Script,
}

impl MatchKind {
    /// Classify a match by its literal prefix.
    pub fn classify(matched: &str) -> Option<Self> {
        let starts_with = |prefix: &str| {
            matched
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        };

        if starts_with("<meta") {
            Some(MatchKind::Meta)
        } else if starts_with("<link") {
            Some(MatchKind::Link)
        } else if starts_with("\"monorailRegion\"") {
            Some(MatchKind::AnalyticsMarker)
        } else if starts_with("<script") {
            Some(MatchKind::Script)
        } else {
            None
        }
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Meta => "remove_no_index",
            MatchKind::Link => "update_canonical",
            MatchKind::AnalyticsMarker => "analytics_region",
            MatchKind::Script => "ignore_redirects",
        }
    }
}

/// Apply the rule for `kind` to one match, counting what changed.
///
/// Returns `None` when the rule is disabled or leaves the text as-is.
pub fn apply(
    kind: MatchKind,
    matched: &str,
    options: &RewriteConfig,
    backend_origin: &str,
    proxy_origin: &str,
    stats: &mut RewriteStats,
) -> Option<String> {
    match kind {
        MatchKind::Meta if options.remove_no_index => {
            stats.no_index_removed += 1;
            Some(String::new())
        }
        MatchKind::Link if options.update_canonical => {
            if backend_origin.is_empty() || !matched.contains(backend_origin) {
                return None;
            }
            stats.canonicals_updated += 1;
            Some(matched.replacen(backend_origin, proxy_origin, 1))
        }
        MatchKind::AnalyticsMarker => {
            stats.analytics_markers += 1;
            Some(GLOBAL_REGION_MARKER.to_string())
        }
        MatchKind::Script => rewrite_script(matched, options, stats),
        _ => None,
    }
}

/// Scripts swallow any marker inside them, so the marker is corrected here
/// regardless of `ignore_redirects`.
fn rewrite_script(script: &str, options: &RewriteConfig, stats: &mut RewriteStats) -> Option<String> {
    let mut text = Cow::Borrowed(script);

    let markers = region_marker().find_iter(&text).count();
    if markers > 0 {
        stats.analytics_markers += markers;
        text = Cow::Owned(region_marker().replace_all(&text, GLOBAL_REGION_MARKER).into_owned());
    }

    if options.ignore_redirects {
        let calls = location_replace().find_iter(&text).count();
        if calls > 0 {
            stats.redirects_stripped += calls;
            text = Cow::Owned(location_replace().replace_all(&text, "").into_owned());
        }
    }

    match text {
        Cow::Borrowed(_) => None,
        Cow::Owned(out) => Some(out),
    }
}
