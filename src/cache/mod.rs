//! Cache Module
//!
//! Provides a generic in-memory cache with sliding TTL expiration and LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::select_victim;
pub use stats::{CacheCounters, CacheStats};
pub use store::GenericCache;

pub(crate) use store::{sweep_expired, CacheState};
