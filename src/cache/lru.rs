//! LRU Victim Selection
//!
//! Approximate least-recently-used eviction by full scan for the oldest touch.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Victim ==
/// Returns the key of the least recently touched entry.
///
/// Scans every entry for the minimum `(last_touch, touch_seq)`. The sequence
/// number is store-wide and monotonic, so entries touched within the same
/// millisecond still evict in touch order. Returns None if `entries` is empty.
pub fn select_victim<T>(entries: &HashMap<String, CacheEntry<T>>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| entry.recency())
        .map(|(key, _)| key.clone())
}
