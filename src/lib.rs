//! Storefront shim library.
//!
//! Serves a headless storefront's pages under the proxy's own domain:
//! resolves the backend's primary domain, forwards the request, and rewrites
//! returned HTML so crawlers and analytics see the proxy origin.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod proxy;
pub mod rewrite;
pub mod storefront;

pub use config::schema::ShimConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use origin::{DomainResolver, ResolvedOrigin};
pub use rewrite::ContentRewriter;
pub use storefront::{StorefrontClient, StorefrontQuery};
