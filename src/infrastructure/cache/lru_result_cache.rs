//! In-memory, cost-bounded LRU result cache.

use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::CachedValue;
use crate::domain::ports::ResultCachePort;

/// Default total cost budget.
pub const DEFAULT_MAX_COST: u64 = 1_000_000;

struct CostedEntries {
    entries: LruCache<String, (CachedValue, u64)>,
    total_cost: u64,
}

/// LRU cache bounded by the total cost of its entries.
///
/// Nothing is evicted while the committed cost stays within `max_cost`.
/// Safe to share between tasks; every operation takes a short lock.
pub struct LruResultCache {
    inner: Mutex<CostedEntries>,
    max_cost: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruResultCache {
    /// Creates a cache with the given cost budget.
    #[must_use]
    pub fn new(max_cost: u64) -> Self {
        Self {
            inner: Mutex::new(CostedEntries {
                entries: LruCache::unbounded(),
                total_cost: 0,
            }),
            max_cost,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let inner = self.inner.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: inner.entries.len(),
            total_cost: inner.total_cost,
            max_cost: self.max_cost,
        }
    }
}

impl Default for LruResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COST)
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    pub entries: usize,
    pub total_cost: u64,
    pub max_cost: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} entries, cost {}/{}, {:.1}% hit rate ({} hits, {} misses)",
            self.entries, self.total_cost, self.max_cost, self.hit_rate, self.hits, self.misses
        )
    }
}

impl ResultCachePort for LruResultCache {
    fn get(&self, key: &str) -> Option<CachedValue> {
        let mut inner = self.inner.lock();
        if let Some((value, _)) = inner.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Result cache hit");
            Some(value.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Result cache miss");
            None
        }
    }

    fn set(&self, key: &str, value: CachedValue, cost: u64) -> bool {
        if cost == 0 || cost > self.max_cost {
            debug!(key, cost, max_cost = self.max_cost, "Rejected cache entry");
            return false;
        }

        let mut inner = self.inner.lock();

        // The cache is unbounded by count, so `push` only hands back the
        // value it replaced for this key.
        if let Some((_, (_, replaced))) = inner.entries.push(key.to_string(), (value, cost)) {
            inner.total_cost -= replaced;
        }
        inner.total_cost += cost;

        while inner.total_cost > self.max_cost {
            let Some((evicted, (_, evicted_cost))) = inner.entries.pop_lru() else {
                break;
            };
            inner.total_cost -= evicted_cost;
            trace!(key = %evicted, "Evicted cache entry over budget");
        }

        true
    }
}
