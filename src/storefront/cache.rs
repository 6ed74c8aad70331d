//! In-memory cache of storefront query results.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde_json::Value;

use crate::storefront::types::CachePolicy;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
    refreshing: bool,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Within max-age.
    Fresh(Value),
    /// Past max-age but inside the stale window. `refresh` is true for exactly
    /// one caller until the entry is stored again or released.
    Stale { data: Value, refresh: bool },
    /// Absent or expired.
    Miss,
}

/// A thread-safe cache keyed by query text.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl QueryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` under `policy` as of `now`.
    pub fn lookup(&self, key: &str, policy: CachePolicy, now: Instant) -> Lookup {
        if !policy.is_cacheable() {
            return Lookup::Miss;
        }
        let Some(mut entry) = self.inner.get_mut(key) else {
            return Lookup::Miss;
        };

        let age = now.saturating_duration_since(entry.stored_at);
        if age <= policy.max_age() {
            return Lookup::Fresh(entry.data.clone());
        }
        if age <= policy.max_age() + policy.stale_while_revalidate() {
            let refresh = !entry.refreshing;
            entry.refreshing = true;
            return Lookup::Stale {
                data: entry.data.clone(),
                refresh,
            };
        }

        drop(entry);
        self.inner.remove(key);
        Lookup::Miss
    }

    /// Store a successful result.
    pub fn store(&self, key: &str, data: Value, now: Instant) {
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: now,
                refreshing: false,
            },
        );
    }

    /// Allow another refresh attempt after a failed one.
    pub fn release(&self, key: &str) {
        if let Some(mut entry) = self.inner.get_mut(key) {
            entry.refreshing = false;
        }
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
