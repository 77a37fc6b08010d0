//! Result cache adapters.

mod lru_result_cache;

pub use lru_result_cache::{CacheStats, DEFAULT_MAX_COST, LruResultCache};
