//! Specification cache using moka
//!
//! An explicitly constructed cache object, injected into the provider. Each
//! entry remembers when it was fetched; moka expires it after the TTL.

use crate::spec::OsiSpec;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on cached documents (one per source location)
const MAX_ENTRIES: u64 = 16;

/// Time-bounded cache of fetched specification documents
#[derive(Debug, Clone)]
pub struct SpecCache {
    inner: Cache<String, Arc<OsiSpec>>,
    ttl: Duration,
}

impl SpecCache {
    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    /// Cached document for a location, if still fresh
    #[inline]
    pub async fn get(&self, location: &str) -> Option<Arc<OsiSpec>> {
        self.inner.get(location).await
    }

    /// Store a freshly fetched document
    #[inline]
    pub async fn insert(&self, location: impl Into<String>, spec: Arc<OsiSpec>) {
        self.inner.insert(location.into(), spec).await;
    }

    /// Drop every cached document
    #[inline]
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Configured time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// When a cached document fetched at `fetched_at` stops being served
    #[must_use]
    pub fn expires_at(&self, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for SpecCache {
    /// One hour TTL
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_insert_and_get() {
        let cache = SpecCache::default();
        let spec = Arc::new(OsiSpec::remote("version: 1", "http://x"));

        cache.insert("http://x", spec.clone()).await;

        let cached = cache.get("http://x").await.unwrap();
        assert_eq!(cached.text, "version: 1");
        assert!(cache.get("http://other").await.is_none());
    }

    #[tokio::test]
    async fn clear_drops_entries() {
        let cache = SpecCache::default();
        cache
            .insert("http://x", Arc::new(OsiSpec::remote("a", "http://x")))
            .await;

        cache.clear();

        assert!(cache.get("http://x").await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = SpecCache::new(Duration::from_millis(50));
        cache
            .insert("http://x", Arc::new(OsiSpec::remote("a", "http://x")))
            .await;
        assert!(cache.get("http://x").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("http://x").await.is_none());
    }

    #[test]
    fn expiry_is_fetch_time_plus_ttl() {
        let cache = SpecCache::new(Duration::from_secs(3600));
        let fetched_at = Utc::now();
        assert_eq!(
            cache.expires_at(fetched_at),
            fetched_at + chrono::Duration::hours(1)
        );
        assert_eq!(cache.ttl(), Duration::from_secs(3600));
    }
}
