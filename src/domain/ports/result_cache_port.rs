//! Result cache port definition.

use crate::domain::entities::CachedValue;

/// Shared, bounded store for upstream lookup results.
///
/// Best effort: any entry may be missing at any time, and a miss only means
/// "not known yet". Implementations must be safe to call concurrently.
pub trait ResultCachePort: Send + Sync {
    /// Returns the cached value for `key`, if present.
    fn get(&self, key: &str) -> Option<CachedValue>;

    /// Stores `value` under `key` with the given cost.
    ///
    /// Returns `false` when the entry was rejected.
    fn set(&self, key: &str, value: CachedValue, cost: u64) -> bool;
}
