//! Storefront API subsystem.
//!
//! # Data Flow
//! ```text
//! DomainResolver
//!     → client.rs (StorefrontQuery::query with a CachePolicy)
//!     → cache.rs (fresh / stale-while-revalidate / miss)
//!     → POST {store_domain}/api/{version}/graphql.json on miss
//! ```
//!
//! The rest of the crate only sees the `StorefrontQuery` trait, so tests and
//! alternative backends can stand in for the GraphQL API.

pub mod cache;
pub mod client;
pub mod types;

pub use client::{StorefrontClient, StorefrontQuery};
pub use types::{CachePolicy, StorefrontError, StorefrontResult};
