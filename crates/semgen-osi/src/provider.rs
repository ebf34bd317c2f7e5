//! Specification provider
//!
//! Resolves the specification through cache, remote source and bundled
//! copy. [`OsiSpecProvider::spec`] cannot fail.

use crate::cache::SpecCache;
use crate::config::OsiSpecConfig;
use crate::error::SpecFetchError;
use crate::source::{HttpSpecSource, OfflineSpecSource, SpecSource};
use crate::spec::OsiSpec;
use std::sync::Arc;

/// Resolves the OSI specification with caching and fallback
#[derive(Debug, Clone)]
pub struct OsiSpecProvider {
    /// Remote source
    source: Arc<dyn SpecSource>,
    /// Injected cache
    cache: SpecCache,
}

impl OsiSpecProvider {
    /// Create provider from a source and a cache
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn SpecSource>, cache: SpecCache) -> Self {
        Self { source, cache }
    }

    /// Create provider from configuration
    ///
    /// # Errors
    /// - `SpecFetchError::Client` if the HTTP client cannot be built
    pub fn from_config(config: &OsiSpecConfig) -> Result<Self, SpecFetchError> {
        let source: Arc<dyn SpecSource> = if config.offline {
            Arc::new(OfflineSpecSource)
        } else {
            Arc::new(HttpSpecSource::from_config(config)?)
        };
        Ok(Self::new(source, SpecCache::new(config.ttl())))
    }

    /// Provider that always serves the bundled copy
    #[inline]
    #[must_use]
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineSpecSource), SpecCache::default())
    }

    /// Current specification
    ///
    /// Served from cache when fresh, otherwise fetched. Any fetch failure
    /// (timeout, non-200, transport, empty body) yields the bundled copy,
    /// which is not cached so the next call tries the network again.
    pub async fn spec(&self) -> Arc<OsiSpec> {
        let location = self.source.location();

        if let Some(cached) = self.cache.get(location).await {
            tracing::debug!(location, fetched_at = %cached.fetched_at, "OSI specification cache hit");
            return cached;
        }

        match self.source.fetch().await {
            Ok(text) => {
                let spec = Arc::new(OsiSpec::remote(text, location));
                self.cache.insert(location, Arc::clone(&spec)).await;
                tracing::info!(location, "fetched OSI specification");
                spec
            }
            Err(SpecFetchError::Disabled) => {
                tracing::debug!("remote OSI specification disabled, using bundled copy");
                Arc::new(OsiSpec::bundled())
            }
            Err(e) => {
                tracing::warn!(location, error = %e, "OSI specification fetch failed, using bundled copy");
                Arc::new(OsiSpec::bundled())
            }
        }
    }

    /// Drop the cache and resolve again
    pub async fn refresh(&self) -> Arc<OsiSpec> {
        self.clear();
        self.spec().await
    }

    /// Drop the cached specification
    #[inline]
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Underlying cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &SpecCache {
        &self.cache
    }

    /// Source location
    #[inline]
    #[must_use]
    pub fn location(&self) -> &str {
        self.source.location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecOrigin;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Source replaying scripted results and counting calls
    #[derive(Debug)]
    struct ScriptedSource {
        results: Mutex<Vec<Result<String, SpecFetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<String, SpecFetchError>>) -> Arc<Self> {
            let mut results = results;
            results.reverse();
            Arc::new(Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpecSource for ScriptedSource {
        fn location(&self) -> &str {
            "http://spec.test/osi.yaml"
        }

        async fn fetch(&self) -> Result<String, SpecFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(SpecFetchError::Transport("script exhausted".into())))
        }
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let source = ScriptedSource::new(vec![Ok("version: \"2.0\"".into())]);
        let provider = OsiSpecProvider::new(source.clone(), SpecCache::default());

        let first = provider.spec().await;
        let second = provider.spec().await;

        assert_eq!(source.calls(), 1);
        assert_eq!(first.version().as_deref(), Some("2.0"));
        assert_eq!(
            second.origin,
            SpecOrigin::Remote {
                url: "http://spec.test/osi.yaml".into()
            }
        );
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let source = ScriptedSource::new(vec![Ok("a".into()), Ok("b".into())]);
        let provider = OsiSpecProvider::new(source.clone(), SpecCache::default());

        assert_eq!(provider.spec().await.text, "a");
        provider.clear();
        assert_eq!(provider.spec().await.text, "b");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_refetches() {
        let source = ScriptedSource::new(vec![Ok("a".into()), Ok("b".into())]);
        let provider = OsiSpecProvider::new(source.clone(), SpecCache::default());

        provider.spec().await;
        assert_eq!(provider.refresh().await.text, "b");
    }

    #[tokio::test]
    async fn failures_fall_back_to_bundled_copy() {
        for failure in [
            SpecFetchError::Timeout { timeout_ms: 10_000 },
            SpecFetchError::Status { status: 404 },
            SpecFetchError::Transport("connection refused".into()),
            SpecFetchError::EmptyBody,
        ] {
            let source = ScriptedSource::new(vec![Err(failure)]);
            let provider = OsiSpecProvider::new(source, SpecCache::default());

            let spec = provider.spec().await;
            assert!(spec.is_bundled());
            assert_eq!(spec.text, crate::BUNDLED_OSI_SPEC);
        }
    }

    #[tokio::test]
    async fn bundled_fallback_is_not_cached() {
        let source = ScriptedSource::new(vec![
            Err(SpecFetchError::Status { status: 500 }),
            Ok("recovered".into()),
        ]);
        let provider = OsiSpecProvider::new(source.clone(), SpecCache::default());

        assert!(provider.spec().await.is_bundled());
        let spec = provider.spec().await;
        assert_eq!(spec.text, "recovered");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn offline_provider_serves_bundled_copy() {
        let provider = OsiSpecProvider::offline();
        assert_eq!(provider.location(), "offline");
        assert!(provider.spec().await.is_bundled());
    }

    #[tokio::test]
    async fn offline_config_builds_offline_provider() {
        let provider =
            OsiSpecProvider::from_config(&OsiSpecConfig::new().with_offline(true)).unwrap();
        assert!(provider.spec().await.is_bundled());
        assert_eq!(provider.cache().ttl(), std::time::Duration::from_secs(3600));
    }
}
