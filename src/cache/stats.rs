//! Cache Statistics Module
//!
//! Tracks cache performance metrics and the snapshot exposed by `stats()`.

use serde::Serialize;

// == Counters ==
/// Running hit, miss and eviction counters kept by the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheCounters {
    /// `get` calls that returned a value
    pub hits: u64,
    /// `get` calls on absent or expired keys
    pub misses: u64,
    /// Entries dropped to make room for a new key
    pub evictions: u64,
}

impl CacheCounters {
    /// Share of `get` calls that hit; 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Cache Stats ==
/// Point-in-time view of the cache.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Entries physically stored, expired or not
    pub total: usize,
    /// Entries still within their TTL
    pub valid: usize,
    /// Entries past their TTL awaiting removal
    pub expired: usize,
    /// Configured capacity
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Best-effort JSON size of valid entries; unserializable values are skipped
    pub approx_memory_bytes: usize,
}
