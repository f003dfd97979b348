//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with sliding TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub data: T,
    /// Last write or successful read (Unix milliseconds)
    pub last_touch: u64,
    /// Idle time after which the entry expires
    pub ttl: Duration,
    /// Number of successful reads since the entry was written
    pub access_count: u64,
    /// Store-wide touch sequence, breaks `last_touch` ties
    pub(crate) touch_seq: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry touched now.
    ///
    /// # Arguments
    /// * `data` - The value to store
    /// * `ttl` - Idle duration before expiry
    /// * `touch_seq` - Sequence number assigned by the owning store
    pub fn new(data: T, ttl: Duration, touch_seq: u64) -> Self {
        Self {
            data,
            last_touch: current_timestamp_ms(),
            ttl,
            access_count: 0,
            touch_seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now - last_touch >= ttl`,
    /// so a fully elapsed TTL is never served.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_touch) >= ttl_ms(self.ttl)
    }

    // == Touch ==
    /// Records a successful read: refreshes `last_touch` and bumps `access_count`.
    ///
    /// Never modifies `data`.
    pub fn touch(&mut self, touch_seq: u64) {
        self.last_touch = current_timestamp_ms();
        self.touch_seq = touch_seq;
        self.access_count = self.access_count.saturating_add(1);
    }

    // == Time To Live ==
    /// Returns the remaining idle time in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let elapsed = current_timestamp_ms().saturating_sub(self.last_touch);
        ttl_ms(self.ttl).saturating_sub(elapsed)
    }

    /// Ordering key used by eviction: older touches sort first.
    pub(crate) fn recency(&self) -> (u64, u64) {
        (self.last_touch, self.touch_seq)
    }
}

fn ttl_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0 rather than panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
