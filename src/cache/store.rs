//! Cache Store Module
//!
//! Generic cache engine combining HashMap storage with sliding TTL expiry,
//! scan-based LRU eviction and a background expiry sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::lru::select_victim;
use crate::cache::{current_timestamp_ms, CacheCounters, CacheEntry, CacheStats};
use crate::config::{
    Config, DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_MAX_SIZE, DEFAULT_TTL_SECS,
};
use crate::tasks::spawn_cleanup_task;

// == Cache State ==
/// Lock-protected contents of a cache.
#[derive(Debug)]
pub(crate) struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    counters: CacheCounters,
    next_seq: u64,
}

impl<T> CacheState<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            counters: CacheCounters::default(),
            next_seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

// == Generic Cache ==
/// Bounded key-value cache with per-entry sliding TTL and LRU eviction.
///
/// The cache owns its expiry sweep: it starts on construction (when a tokio
/// runtime is available) and stops on [`GenericCache::destroy`] or drop.
/// After `destroy()` every operation is a no-op.
#[derive(Debug)]
pub struct GenericCache<T> {
    state: Arc<RwLock<CacheState<T>>>,
    max_size: usize,
    default_ttl: Duration,
    destroyed: AtomicBool,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<T> GenericCache<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new cache and starts its expiry sweep.
    ///
    /// Zero values are replaced by the defaults (1000 entries, 1 hour TTL,
    /// 60 second sweep) instead of being rejected.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Idle TTL for entries set without an explicit TTL
    /// * `cleanup_interval` - Period of the background expiry sweep
    pub fn new(max_size: usize, default_ttl: Duration, cleanup_interval: Duration) -> Self {
        let max_size = if max_size == 0 {
            warn!("Cache max_size of 0 is invalid, using {}", DEFAULT_MAX_SIZE);
            DEFAULT_MAX_SIZE
        } else {
            max_size
        };
        let default_ttl = if default_ttl.is_zero() {
            warn!("Cache TTL of 0 is invalid, using {}s", DEFAULT_TTL_SECS);
            Duration::from_secs(DEFAULT_TTL_SECS)
        } else {
            default_ttl
        };
        let cleanup_interval = if cleanup_interval.is_zero() {
            Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS)
        } else {
            cleanup_interval
        };

        let state = Arc::new(RwLock::new(CacheState::new()));

        let sweeper = match Handle::try_current() {
            Ok(_) => Some(spawn_cleanup_task(Arc::downgrade(&state), cleanup_interval)),
            Err(_) => {
                warn!("No tokio runtime available, expiry sweep disabled");
                None
            }
        };

        Self {
            state,
            max_size,
            default_ttl,
            destroyed: AtomicBool::new(false),
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Creates a cache sized and timed from the service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_max_size,
            config.cache_ttl(),
            config.cleanup_interval(),
        )
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry under `key`.
    ///
    /// When `key` is new and the cache is full, exactly one entry is evicted
    /// first: the one touched least recently. Any string is accepted as a key.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional idle TTL (uses the default when None or zero)
    pub async fn set(&self, key: impl Into<String>, value: T, ttl: Option<Duration>) {
        if self.is_destroyed() {
            return;
        }

        let key = key.into();
        let ttl = ttl.filter(|t| !t.is_zero()).unwrap_or(self.default_ttl);

        let mut guard = self.state.write().await;
        // destroy() may have cleared the map while we waited for the lock
        if self.is_destroyed() {
            return;
        }
        let state = &mut *guard;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_size {
            if let Some(victim) = select_victim(&state.entries) {
                state.entries.remove(&victim);
                state.counters.record_eviction();
                debug!(key = ?victim, "Evicted least recently used entry");
            }
        }

        let seq = state.next_seq();
        state.entries.insert(key, CacheEntry::new(value, ttl, seq));
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// Expired entries are removed and reported as absent. A hit slides the
    /// entry's expiry window and increments its access count.
    pub async fn get(&self, key: &str) -> Option<T> {
        if self.is_destroyed() {
            return None;
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let now = current_timestamp_ms();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                state.counters.record_miss();
                return None;
            }
        };

        if expired {
            state.entries.remove(key);
            state.counters.record_miss();
            return None;
        }

        let seq = state.next_seq();
        let entry = state.entries.get_mut(key)?;
        entry.touch(seq);
        let data = entry.data.clone();
        state.counters.record_hit();
        Some(data)
    }

    // == Has ==
    /// Checks whether a live entry exists under `key`.
    ///
    /// Expired entries are removed as a side effect. Does not refresh the
    /// entry or count as a hit.
    pub async fn has(&self, key: &str) -> bool {
        if self.is_destroyed() {
            return false;
        }

        let mut state = self.state.write().await;
        match state.entries.get(key).map(|entry| entry.is_expired()) {
            Some(false) => true,
            Some(true) => {
                state.entries.remove(key);
                false
            }
            None => false,
        }
    }

    // == Prefix Queries ==
    /// Checks whether any live entry's key starts with `prefix`.
    pub async fn has_prefix(&self, prefix: &str) -> bool {
        if self.is_destroyed() {
            return false;
        }

        let state = self.state.read().await;
        let now = current_timestamp_ms();
        state
            .entries
            .iter()
            .any(|(key, entry)| key.starts_with(prefix) && !entry.is_expired_at(now))
    }

    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub async fn delete_prefix(&self, prefix: &str) -> usize {
        if self.is_destroyed() {
            return 0;
        }

        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        before - state.entries.len()
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if an entry was removed.
    pub async fn delete(&self, key: &str) -> bool {
        if self.is_destroyed() {
            return false;
        }

        self.state.write().await.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub async fn clear(&self) {
        if self.is_destroyed() {
            return;
        }

        self.state.write().await.entries.clear();
    }

    // == Size ==
    /// Returns the number of live entries, pruning expired ones first.
    pub async fn size(&self) -> usize {
        if self.is_destroyed() {
            return 0;
        }

        let mut state = self.state.write().await;
        let now = current_timestamp_ms();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        state.entries.len()
    }

    // == Stats ==
    /// Returns a statistics snapshot.
    ///
    /// Memory usage is estimated from the JSON encoding of each live value;
    /// values that fail to serialize are left out of the estimate. A
    /// destroyed cache reports an empty snapshot.
    pub async fn stats(&self) -> CacheStats {
        if self.is_destroyed() {
            return CacheStats {
                max_size: self.max_size,
                ..Default::default()
            };
        }

        let state = self.state.read().await;
        let now = current_timestamp_ms();

        let mut valid = 0;
        let mut approx_memory_bytes = 0;
        for (key, entry) in &state.entries {
            if entry.is_expired_at(now) {
                continue;
            }
            valid += 1;
            if let Ok(bytes) = serde_json::to_vec(&entry.data) {
                approx_memory_bytes += key.len() + bytes.len();
            }
        }

        let total = state.entries.len();
        CacheStats {
            total,
            valid,
            expired: total - valid,
            max_size: self.max_size,
            hits: state.counters.hits,
            misses: state.counters.misses,
            evictions: state.counters.evictions,
            hit_rate: state.counters.hit_rate(),
            approx_memory_bytes,
        }
    }

    // == Cleanup Expired ==
    /// Runs one expiry sweep. Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        if self.is_destroyed() {
            return 0;
        }

        sweep_expired(&self.state).await
    }

    /// Keys expired at the time of the call.
    #[cfg(test)]
    pub(crate) async fn expired_keys(&self) -> Vec<String> {
        expired_candidates(&self.state).await
    }

    /// Deletes those of `keys` that are still expired.
    #[cfg(test)]
    pub(crate) async fn remove_still_expired(&self, keys: Vec<String>) -> usize {
        remove_still_expired(&self.state, keys).await
    }

    // == Lifecycle ==
    /// Configured capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Default idle TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// True once [`GenericCache::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Stops the expiry sweep and releases all entries.
    ///
    /// Safe to call more than once; only the first call has an effect.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.stop_sweeper();
        self.state.write().await.entries.clear();
        info!("Cache destroyed");
    }

    /// True while the background sweep task is alive.
    pub fn sweep_running(&self) -> bool {
        match self.sweeper.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(_) => false,
        }
    }

    fn stop_sweeper(&self) {
        let handle = match self.sweeper.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl<T> Drop for GenericCache<T> {
    fn drop(&mut self) {
        let handle = match self.sweeper.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

// == Sweep ==
/// Two-phase expiry sweep used by the background task.
///
/// Candidates are collected under the read lock; each one is re-checked
/// under the write lock, so an entry refreshed in between is kept.
pub(crate) async fn sweep_expired<T>(state: &RwLock<CacheState<T>>) -> usize {
    let candidates = expired_candidates(state).await;
    if candidates.is_empty() {
        return 0;
    }
    remove_still_expired(state, candidates).await
}

async fn expired_candidates<T>(state: &RwLock<CacheState<T>>) -> Vec<String> {
    let state = state.read().await;
    let now = current_timestamp_ms();
    state
        .entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect()
}

async fn remove_still_expired<T>(state: &RwLock<CacheState<T>>, keys: Vec<String>) -> usize {
    let mut state = state.write().await;
    let mut removed = 0;
    for key in keys {
        let still_expired = state
            .entries
            .get(&key)
            .is_some_and(|entry| entry.is_expired());
        if still_expired {
            state.entries.remove(&key);
            removed += 1;
        }
    }
    removed
}
