//! Rate repository: the only path from callers to rate data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tcurrency_common::{now, CurrencyCode};
use tracing::{info, instrument, warn};

use crate::cache::{CacheStats, RateCache, RateCacheConfig};
use crate::error::FxResult;
use crate::provider::RateSource;
use crate::table::RateTable;

/// Configuration for the rate repository.
#[derive(Debug, Clone, Default)]
pub struct RateRepositoryConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

/// Serves rate tables from a per-session cache, falling back to the source.
///
/// Fresh cache entries are returned without a network call. When the source
/// fails, any cached table for the base is served regardless of its age; only
/// a failure with nothing cached reaches the caller.
///
/// Two overlapping fetches for the same base both go to the source and both
/// store their result; the later store wins.
pub struct RateRepository {
    source: Arc<dyn RateSource>,
    cache: RateCache,
    network_fetches: AtomicU64,
    cache_hits: AtomicU64,
    stale_serves: AtomicU64,
    failures: AtomicU64,
}

impl RateRepository {
    /// Create a new repository over `source`.
    pub fn new(source: Arc<dyn RateSource>, config: RateRepositoryConfig) -> Self {
        Self {
            source,
            cache: RateCache::with_config(config.cache),
            network_fetches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            stale_serves: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Get the rate table for `base`.
    #[instrument(skip(self), fields(base = %base, source = self.source.name()))]
    pub async fn fetch(&self, base: &CurrencyCode) -> FxResult<Arc<RateTable>> {
        if let Some(cached) = self.cache.get_fresh(base) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        info!("Fetching rate table");
        self.network_fetches.fetch_add(1, Ordering::Relaxed);

        match self.source.fetch_table(base).await {
            Ok(table) => {
                let stored = self.cache.insert(base.clone(), table);
                info!(rates = stored.len(), date = ?stored.date, "Rate table updated");
                Ok(stored)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);

                match self.cache.get_any(base) {
                    Some(stale) => {
                        self.stale_serves.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            error = %e,
                            age_secs = stale.age_at(now()).num_seconds(),
                            "Rate fetch failed, serving cached table"
                        );
                        Ok(stale)
                    }
                    None => {
                        warn!(error = %e, "Rate fetch failed with nothing cached");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Drop every cached table so the next fetch goes to the source.
    pub fn invalidate(&self) {
        info!(entries = self.cache.len(), "Invalidating rate cache");
        self.cache.clear();
    }

    /// Peek at the cached table for `base` without fetching.
    pub fn cached(&self, base: &CurrencyCode) -> Option<Arc<RateTable>> {
        self.cache.get_any(base)
    }

    /// Get repository counters.
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            stale_serves: self.stale_serves.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Repository counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub network_fetches: u64,
    pub cache_hits: u64,
    pub stale_serves: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::provider::{FileRateSource, MockRateSource};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn usd_table(eur: f64) -> RateTable {
        RateTable::from_pairs(CurrencyCode::usd(), [("USD", 1.0), ("EUR", eur), ("JPY", 150.0)])
    }

    fn setup(window: Duration) -> (Arc<MockRateSource>, RateRepository) {
        let source = Arc::new(MockRateSource::new("test"));
        source.set_table(usd_table(0.9));

        let config = RateRepositoryConfig {
            cache: RateCacheConfig {
                freshness_window: window,
            },
        };
        let repository = RateRepository::new(source.clone(), config);
        (source, repository)
    }

    #[tokio::test]
    async fn test_fetch_within_window_hits_cache() {
        let (source, repository) = setup(Duration::minutes(5));

        let first = repository.fetch(&CurrencyCode::usd()).await.unwrap();
        let second = repository.fetch(&CurrencyCode::usd()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);

        let stats = repository.stats();
        assert_eq!(stats.network_fetches, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (source, repository) = setup(Duration::milliseconds(50));

        repository.fetch(&CurrencyCode::usd()).await.unwrap();
        source.set_table(usd_table(0.95));

        tokio::time::sleep(StdDuration::from_millis(60)).await;

        let refreshed = repository.fetch(&CurrencyCode::usd()).await.unwrap();
        assert_eq!(refreshed.rate(&CurrencyCode::eur()), 0.95);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_serves_stale_table() {
        let (source, repository) = setup(Duration::milliseconds(10));

        let original = repository.fetch(&CurrencyCode::usd()).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        source.set_failing(true);
        let served = repository.fetch(&CurrencyCode::usd()).await.unwrap();

        assert!(Arc::ptr_eq(&original, &served));
        assert_eq!(source.calls(), 2);

        let stats = repository.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.stale_serves, 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache_propagates() {
        let (source, repository) = setup(Duration::minutes(5));
        source.set_failing(true);

        let result = repository.fetch(&CurrencyCode::usd()).await;
        assert!(matches!(result, Err(FxError::Network(_))));

        source.set_failing(false);
        let unknown = repository.fetch(&CurrencyCode::jpy()).await;
        assert!(matches!(unknown, Err(FxError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_stale_fallback_is_per_base() {
        let (source, repository) = setup(Duration::minutes(5));
        repository.fetch(&CurrencyCode::usd()).await.unwrap();

        source.set_failing(true);
        let other_base = repository.fetch(&CurrencyCode::eur()).await;
        assert!(other_base.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_forces_network() {
        let (source, repository) = setup(Duration::minutes(5));

        repository.fetch(&CurrencyCode::usd()).await.unwrap();
        repository.invalidate();
        assert!(repository.cached(&CurrencyCode::usd()).is_none());

        source.set_table(usd_table(0.92));
        let table = repository.fetch(&CurrencyCode::usd()).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(table.rate(&CurrencyCode::eur()), 0.92);
    }

    #[tokio::test]
    async fn test_invalidate_then_failure_propagates() {
        let (source, repository) = setup(Duration::minutes(5));
        repository.fetch(&CurrencyCode::usd()).await.unwrap();

        repository.invalidate();
        source.set_failing(true);

        assert!(repository.fetch(&CurrencyCode::usd()).await.is_err());
    }

    #[tokio::test]
    async fn test_table_with_foreign_base_is_cached_under_requested_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        std::fs::write(&path, r#"{"base":"EUR","rates":{"USD":1.08}}"#).unwrap();

        let config = RateRepositoryConfig {
            cache: RateCacheConfig {
                freshness_window: Duration::milliseconds(200),
            },
        };
        let repository = RateRepository::new(Arc::new(FileRateSource::new(&path)), config);
        let usd = CurrencyCode::usd();

        let first = repository.fetch(&usd).await.unwrap();
        let second = repository.fetch(&usd).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.base, CurrencyCode::eur());
        assert_eq!(repository.stats().network_fetches, 1);
        assert_eq!(repository.stats().cache_hits, 1);

        tokio::time::sleep(StdDuration::from_millis(250)).await;
        std::fs::remove_file(&path).unwrap();

        let served = repository.fetch(&usd).await.unwrap();
        assert!(Arc::ptr_eq(&first, &served));
        assert_eq!(repository.stats().stale_serves, 1);
        assert!(repository.cached(&usd).is_some());
    }

    #[tokio::test]
    async fn test_empty_payload_falls_back_to_cached_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        std::fs::write(&path, r#"{"base":"USD","rates":{"EUR":0.9}}"#).unwrap();

        let config = RateRepositoryConfig {
            cache: RateCacheConfig {
                freshness_window: Duration::milliseconds(10),
            },
        };
        let repository = RateRepository::new(Arc::new(FileRateSource::new(&path)), config);
        let usd = CurrencyCode::usd();

        let original = repository.fetch(&usd).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        std::fs::write(&path, r#"{"base":"USD","rates":{}}"#).unwrap();

        let served = repository.fetch(&usd).await.unwrap();
        assert!(Arc::ptr_eq(&original, &served));
        assert_eq!(served.rate(&CurrencyCode::eur()), 0.9);
        assert_eq!(repository.stats().stale_serves, 1);
    }

    #[tokio::test]
    async fn test_overlapping_fetches_share_one_slot() {
        let source = Arc::new(MockRateSource::new("slow").with_delay(StdDuration::from_millis(20)));
        source.set_table(usd_table(0.9));
        let repository = RateRepository::new(source.clone(), RateRepositoryConfig::default());

        let base = CurrencyCode::usd();
        let (a, b) = tokio::join!(repository.fetch(&base), repository.fetch(&base));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.calls(), 2);
        assert_eq!(repository.cache_stats().total_entries, 1);
    }
}
