//! Rate table cache keyed by base currency.

use chrono::Duration;
use dashmap::DashMap;
use std::sync::Arc;
use tcurrency_common::{constants, is_fresh_within, now, CurrencyCode, Timestamp};
use tracing::debug;

use crate::table::RateTable;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<RateTable>,
    stored_at: Timestamp,
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a stored table is served without refetching.
    pub freshness_window: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::rate_freshness_window(),
        }
    }
}

/// Thread-safe cache holding at most one table per base currency.
///
/// Entries never expire on their own. A stale entry is simply not returned by
/// [`RateCache::get_fresh`], but remains available to [`RateCache::get_any`]
/// until the next successful store or [`RateCache::clear`].
pub struct RateCache {
    cache: DashMap<CurrencyCode, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get the table for `base` if it is still within the freshness window.
    pub fn get_fresh(&self, base: &CurrencyCode) -> Option<Arc<RateTable>> {
        self.get_fresh_at(base, now())
    }

    /// Same as [`RateCache::get_fresh`], evaluated at `at`.
    pub fn get_fresh_at(&self, base: &CurrencyCode, at: Timestamp) -> Option<Arc<RateTable>> {
        match self.cache.get(base) {
            Some(entry) if is_fresh_within(entry.stored_at, self.config.freshness_window, at) => {
                debug!(base = %base, "Cache hit");
                Some(entry.table.clone())
            }
            Some(_) => {
                debug!(base = %base, "Cache entry stale");
                None
            }
            None => {
                debug!(base = %base, "Cache miss");
                None
            }
        }
    }

    /// Get the table for `base` regardless of age.
    pub fn get_any(&self, base: &CurrencyCode) -> Option<Arc<RateTable>> {
        self.cache.get(base).map(|entry| entry.table.clone())
    }

    /// Store the table fetched for `base`, replacing any previous one.
    ///
    /// The entry is keyed by the requested base, whatever base the table
    /// itself reports.
    pub fn insert(&self, base: CurrencyCode, table: RateTable) -> Arc<RateTable> {
        self.insert_at(base, table, now())
    }

    /// Store a table as if it was stored at `stored_at`.
    pub fn insert_at(&self, base: CurrencyCode, table: RateTable, stored_at: Timestamp) -> Arc<RateTable> {
        let table = Arc::new(table);
        self.cache.insert(
            base,
            CacheEntry {
                table: table.clone(),
                stored_at,
            },
        );
        table
    }

    /// Clear all cached tables.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let at = now();
        let total = self.cache.len();
        let fresh = self
            .cache
            .iter()
            .filter(|e| is_fresh_within(e.stored_at, self.config.freshness_window, at))
            .count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            stale_entries: total - fresh,
        }
    }

    /// Configured freshness window.
    pub fn freshness_window(&self) -> Duration {
        self.config.freshness_window
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}
