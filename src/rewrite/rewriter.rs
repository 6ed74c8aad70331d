//! Body rewriting for the read path.

use regex::Captures;

use crate::config::RewriteConfig;
use crate::rewrite::rules::{self, MatchKind};

/// How many times each rule changed the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub no_index_removed: usize,
    pub canonicals_updated: usize,
    pub analytics_markers: usize,
    pub redirects_stripped: usize,
    pub origin_substitutions: usize,
}

impl RewriteStats {
    /// Counts keyed by rule label, for metrics.
    pub fn by_rule(&self) -> [(&'static str, usize); 5] {
        [
            (MatchKind::Meta.as_str(), self.no_index_removed),
            (MatchKind::Link.as_str(), self.canonicals_updated),
            (MatchKind::AnalyticsMarker.as_str(), self.analytics_markers),
            (MatchKind::Script.as_str(), self.redirects_stripped),
            ("origin_substitution", self.origin_substitutions),
        ]
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A rewritten body and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub body: String,
    pub stats: RewriteStats,
}

/// Rewrites backend HTML so it reads as if served from the proxy origin.
#[derive(Debug, Clone)]
pub struct ContentRewriter<'a> {
    options: RewriteConfig,
    backend_origin: &'a str,
    proxy_origin: &'a str,
}

impl<'a> ContentRewriter<'a> {
    pub fn new(options: RewriteConfig, backend_origin: &'a str, proxy_origin: &'a str) -> Self {
        Self {
            options,
            backend_origin,
            proxy_origin,
        }
    }

    /// Apply the targeted rules in one scan, then replace every remaining
    /// occurrence of the backend origin with the proxy origin.
    pub fn rewrite(&self, body: &str) -> Rewritten {
        let mut stats = RewriteStats::default();

        let targeted = rules::combined().replace_all(body, |caps: &Captures| {
            let matched = &caps[0];
            MatchKind::classify(matched)
                .and_then(|kind| {
                    rules::apply(
                        kind,
                        matched,
                        &self.options,
                        self.backend_origin,
                        self.proxy_origin,
                        &mut stats,
                    )
                })
                .unwrap_or_else(|| matched.to_string())
        });

        let body = if self.backend_origin.is_empty() {
            targeted.into_owned()
        } else {
            stats.origin_substitutions = targeted.matches(self.backend_origin).count();
            if stats.origin_substitutions == 0 {
                targeted.into_owned()
            } else {
                targeted.replace(self.backend_origin, self.proxy_origin)
            }
        };

        Rewritten { body, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND: &str = "https://shop.example.com";
    const PROXY: &str = "https://www.example.com";

    fn rewrite_with(options: RewriteConfig, body: &str) -> Rewritten {
        ContentRewriter::new(options, BACKEND, PROXY).rewrite(body)
    }

    fn rewrite(body: &str) -> String {
        rewrite_with(RewriteConfig::default(), body).body
    }

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
<title>Hat</title>
<meta name="robots" content="noindex">
<link rel="canonical" href="https://shop.example.com/products/hat">
<script>var cfg = {"monorailRegion":"shop_domain"};</script>
<script>
  if (!window.hydrogen) {
    window.location.replace("https://hydrogen.example.com/products/hat");
  }
  init();
</script>
</head>
<body><a href="https://shop.example.com/cart">Cart</a></body>
</html>"#;

    #[test]
    fn test_noindex_removed_when_enabled() {
        let out = rewrite(PAGE);
        assert!(!out.contains("noindex"));
        assert!(out.contains("<title>Hat</title>\n\n<link"));
    }

    #[test]
    fn test_noindex_preserved_when_disabled() {
        let options = RewriteConfig {
            remove_no_index: false,
            ..Default::default()
        };
        let out = rewrite_with(options, PAGE).body;
        assert!(out.contains(r#"<meta name="robots" content="noindex">"#));
    }

    #[test]
    fn test_canonical_points_at_proxy() {
        let out = rewrite(PAGE);
        assert!(out.contains(r#"<link rel="canonical" href="https://www.example.com/products/hat">"#));
    }

    #[test]
    fn test_analytics_marker_always_rewritten() {
        let options = RewriteConfig {
            remove_no_index: false,
            update_canonical: false,
            ignore_redirects: false,
        };
        let out = rewrite_with(options, PAGE).body;
        assert!(out.contains(r#""monorailRegion":"global""#));
        assert!(!out.contains("shop_domain"));
    }

    #[test]
    fn test_script_redirect_stripped_other_statements_kept() {
        let out = rewrite(PAGE);
        assert!(!out.contains("window.location.replace"));
        assert!(out.contains("if (!window.hydrogen) {"));
        assert!(out.contains("init();"));
    }

    #[test]
    fn test_script_redirect_kept_when_disabled() {
        let options = RewriteConfig {
            ignore_redirects: false,
            ..Default::default()
        };
        let out = rewrite_with(options, PAGE).body;
        assert!(out.contains(r#"window.location.replace("https://hydrogen.example.com/products/hat");"#));
    }

    #[test]
    fn test_global_substitution_catches_remaining_references() {
        let out = rewrite(PAGE);
        assert!(!out.contains(BACKEND));
        assert!(out.contains(r#"<a href="https://www.example.com/cart">"#));
    }

    #[test]
    fn test_global_substitution_applies_to_plain_text() {
        let out = rewrite("<p>Also visit https://shop.example.com today</p>");
        assert_eq!(out, "<p>Also visit https://www.example.com today</p>");
    }

    #[test]
    fn test_no_patterns_passes_through() {
        let body = "<html><body><h1>Plain</h1></body></html>";
        let result = rewrite_with(RewriteConfig::default(), body);
        assert_eq!(result.body, body);
        assert!(result.stats.is_empty());
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite(PAGE);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stats() {
        let stats = rewrite_with(RewriteConfig::default(), PAGE).stats;
        assert_eq!(stats.no_index_removed, 1);
        assert_eq!(stats.canonicals_updated, 1);
        assert_eq!(stats.analytics_markers, 1);
        assert_eq!(stats.redirects_stripped, 1);
        // the cart link; the canonical was already rewritten by its rule
        assert_eq!(stats.origin_substitutions, 1);
    }

    #[test]
    fn test_untouched_bytes_are_stable() {
        let body = "<div  class='x'>\r\n\t<img src=/a.png></div><script src=\"/app.js\"></script>";
        assert_eq!(rewrite(body), body);
    }
}
