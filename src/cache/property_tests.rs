//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache's correctness properties over random
//! operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use tokio_test::block_on;

use crate::cache::GenericCache;

const ROOMY: usize = 100;
const LONG_TTL: Duration = Duration::from_secs(300);

/// Builds a cache outside any runtime, so no sweep task runs during a case.
fn test_cache<T>(max_entries: usize) -> GenericCache<T>
where
    T: Clone + serde::Serialize + Send + Sync + 'static,
{
    GenericCache::new(max_entries, LONG_TTL, LONG_TTL)
}

// == Strategies ==
/// Slug-like keys
fn slug_key() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,48}(::[a-z]{2})?"
}

/// Keys of any shape, including empty, whitespace and control characters
fn any_key() -> impl Strategy<Value = String> {
    prop_oneof![
        slug_key(),
        Just(String::new()),
        "[ \t\n]{1,8}",
        "\\PC{0,32}",
        "[\\x00-\\x1f]{1,16}",
    ]
}

fn text_value() -> impl Strategy<Value = String> {
    "\\PC{0,200}"
}

#[derive(Debug, Clone)]
enum Op {
    Put(String, u32),
    Read(String),
    Remove(String),
}

/// Operations over a small key pool, so reads and removes often hit.
fn op_strategy() -> impl Strategy<Value = Op> {
    let key = prop::sample::select(vec!["a", "b", "c", "d", "e", "f"]).prop_map(String::from);
    prop_oneof![
        (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        key.clone().prop_map(Op::Read),
        key.prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, hit and miss counters match the
    // observed get results and `total` matches `size()`.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let cache = test_cache::<u32>(ROOMY);
        let (mut hits, mut misses) = (0u64, 0u64);

        block_on(async {
            for op in ops {
                match op {
                    Op::Put(key, value) => cache.set(key, value, None).await,
                    Op::Read(key) => match cache.get(&key).await {
                        Some(_) => hits += 1,
                        None => misses += 1,
                    },
                    Op::Remove(key) => {
                        cache.delete(&key).await;
                    }
                }
            }

            let stats = cache.stats().await;
            prop_assert_eq!(stats.hits, hits);
            prop_assert_eq!(stats.misses, misses);
            prop_assert_eq!(stats.total, cache.size().await);
            prop_assert_eq!(stats.valid, stats.total);
            Ok(())
        })?;
    }

    // Storing then retrieving before expiry returns the stored value,
    // whatever the key looks like.
    #[test]
    fn prop_roundtrip_any_key(key in any_key(), value in text_value()) {
        let cache = test_cache(ROOMY);

        block_on(async {
            cache.set(key.clone(), value.clone(), None).await;
            prop_assert_eq!(cache.get(&key).await, Some(value));
            Ok(())
        })?;
    }

    // After delete, get reports absent.
    #[test]
    fn prop_delete_removes_entry(key in any_key(), value in any::<u32>()) {
        let cache = test_cache(ROOMY);

        block_on(async {
            cache.set(key.clone(), value, None).await;
            prop_assert!(cache.delete(&key).await);
            prop_assert!(!cache.delete(&key).await, "Second delete should report absent");
            prop_assert!(cache.get(&key).await.is_none());
            Ok(())
        })?;
    }

    // Storing V1 then V2 under one key returns V2 and keeps one entry.
    #[test]
    fn prop_overwrite_keeps_one_entry(key in slug_key(), first in any::<u32>(), second in any::<u32>()) {
        let cache = test_cache(ROOMY);

        block_on(async {
            cache.set(key.clone(), first, None).await;
            cache.set(key.clone(), second, None).await;

            prop_assert_eq!(cache.get(&key).await, Some(second));
            prop_assert_eq!(cache.size().await, 1);
            Ok(())
        })?;
    }

    // The number of entries never exceeds max_size.
    #[test]
    fn prop_size_never_exceeds_capacity(
        keys in prop::collection::vec(any_key(), 1..200),
        capacity in 1usize..60
    ) {
        let cache = test_cache(capacity);

        block_on(async {
            for (i, key) in keys.into_iter().enumerate() {
                cache.set(key, i, None).await;
                let size = cache.size().await;
                prop_assert!(size <= capacity, "size {} over capacity {}", size, capacity);
            }
            Ok(())
        })?;
    }

    // Inserting max_size + k distinct keys in order evicts exactly the first k.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(slug_key(), 5..30),
        capacity in 2usize..5
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let cache = test_cache(capacity);

        block_on(async {
            for key in &keys {
                cache.set(key.clone(), 0u8, None).await;
            }

            let survivors: HashSet<&String> = keys.iter().rev().take(capacity).collect();
            for key in &keys {
                prop_assert_eq!(cache.has(key).await, survivors.contains(key), "Unexpected eviction state for {}", key);
            }
            Ok(())
        })?;
    }

    // Reading the oldest entry before inserting a new key protects it and
    // moves eviction to the next oldest.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set(slug_key(), 4..10),
        extra in "[A-Z]{1,8}"
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let cache = test_cache(keys.len());

        block_on(async {
            for key in &keys {
                cache.set(key.clone(), 0u8, None).await;
            }

            prop_assert!(cache.get(&keys[0]).await.is_some());
            cache.set(extra.clone(), 1u8, None).await;

            prop_assert!(cache.has(&keys[0]).await, "Recently read key was evicted");
            prop_assert!(!cache.has(&keys[1]).await, "Next oldest key should be evicted");
            prop_assert!(cache.has(&extra).await);
            Ok(())
        })?;
    }
}

// Sleeps, so only a handful of cases
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // After the TTL elapses both get and has report absent, and the entry
    // does not come back on later reads.
    #[test]
    fn prop_entry_expires_after_ttl(key in any_key(), value in text_value()) {
        let cache = test_cache(ROOMY);

        block_on(async {
            cache.set(key.clone(), value.clone(), Some(Duration::from_millis(40))).await;
            prop_assert_eq!(cache.get(&key).await, Some(value));

            tokio::time::sleep(Duration::from_millis(80)).await;

            prop_assert!(!cache.has(&key).await, "Entry should be absent after TTL");
            prop_assert!(cache.get(&key).await.is_none(), "Entry should not be found after TTL");
            prop_assert!(cache.get(&key).await.is_none(), "Entry must not resurface");
            Ok(())
        })?;
    }
}
