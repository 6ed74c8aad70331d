//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shim.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront shim.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ShimConfig {
    /// Listener configuration (bind address, public origin).
    pub listener: ListenerConfig,

    /// Storefront API used to resolve the backend's primary domain.
    pub storefront: StorefrontConfig,

    /// Toggles for the HTML rewrite rules.
    pub rewrite: RewriteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Public origin of the shim (e.g., "https://www.example.com").
    ///
    /// When unset the origin is derived from each request's `Host`.
    pub public_origin: Option<String>,

    /// Take scheme and host from `X-Forwarded-Proto`/`X-Forwarded-Host`.
    ///
    /// Only enable behind a proxy that overwrites these headers; otherwise
    /// clients choose the origin written into rewritten pages.
    pub trust_forwarded_headers: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_origin: None,
            trust_forwarded_headers: false,
        }
    }
}

/// Storefront API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Store domain hosting the GraphQL endpoint (e.g., "shop.myshopify.com").
    pub store_domain: String,

    /// Storefront API version segment of the endpoint path.
    pub api_version: String,

    /// Public Storefront API access token.
    pub public_access_token: Option<String>,

    /// GraphQL request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            store_domain: String::new(),
            api_version: "2024-01".to_string(),
            public_access_token: None,
            request_timeout_secs: 10,
        }
    }
}

impl StorefrontConfig {
    /// Full GraphQL endpoint URL for this store.
    ///
    /// A bare domain is served over https; an explicit scheme is kept as-is.
    pub fn endpoint(&self) -> String {
        let domain = self.store_domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{}/api/{}/graphql.json", domain, self.api_version)
        } else {
            format!("https://{}/api/{}/graphql.json", domain, self.api_version)
        }
    }
}

/// Rewrite rule toggles. Each flag controls exactly one rule.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Delete `<meta name="robots" content="noindex...">` tags.
    pub remove_no_index: bool,

    /// Point `<link rel="canonical">` at the shim's origin.
    pub update_canonical: bool,

    /// Strip `window.location.replace(...)` calls from inline scripts.
    pub ignore_redirects: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            remove_no_index: true,
            update_canonical: true,
            ignore_redirects: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_defaults_all_enabled() {
        let config = RewriteConfig::default();
        assert!(config.remove_no_index);
        assert!(config.update_canonical);
        assert!(config.ignore_redirects);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ShimConfig = toml::from_str(
            r#"
            [storefront]
            store_domain = "demo.myshopify.com"

            [rewrite]
            update_canonical = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storefront.store_domain, "demo.myshopify.com");
        assert_eq!(config.storefront.api_version, "2024-01");
        assert!(config.rewrite.remove_no_index);
        assert!(!config.rewrite.update_canonical);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(!config.listener.trust_forwarded_headers);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_endpoint() {
        let mut storefront = StorefrontConfig {
            store_domain: "demo.myshopify.com".into(),
            ..Default::default()
        };
        assert_eq!(
            storefront.endpoint(),
            "https://demo.myshopify.com/api/2024-01/graphql.json"
        );

        storefront.store_domain = "http://127.0.0.1:4000/".into();
        assert_eq!(
            storefront.endpoint(),
            "http://127.0.0.1:4000/api/2024-01/graphql.json"
        );
    }

    #[test]
    fn test_log_format_parses_lowercase() {
        let config: ObservabilityConfig = toml::from_str(r#"log_format = "json""#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
