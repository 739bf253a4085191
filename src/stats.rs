use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the listing cache. Shared by the list and write services.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    store_fetches: AtomicU64,
    populations: AtomicU64,
    invalidated_keys: AtomicU64,
    cache_errors: AtomicU64,
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cache hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get the number of cache misses, including degraded reads
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get the number of count-and-fetch transactions issued to the store
    pub fn store_fetches(&self) -> u64 {
        self.store_fetches.load(Ordering::Relaxed)
    }

    /// Get the number of pages written to the cache
    pub fn populations(&self) -> u64 {
        self.populations.load(Ordering::Relaxed)
    }

    /// Get the number of cache keys removed by invalidation
    pub fn invalidated_keys(&self) -> u64 {
        self.invalidated_keys.load(Ordering::Relaxed)
    }

    /// Get the number of cache operations that failed or timed out
    pub fn cache_errors(&self) -> u64 {
        self.cache_errors.load(Ordering::Relaxed)
    }

    /// Calculate the cache hit rate (hits / (hits + misses))
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_fetch(&self) {
        self.store_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_population(&self) {
        self.populations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidated(&self, keys: usize) {
        self.invalidated_keys.fetch_add(keys as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }
}
