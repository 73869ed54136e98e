//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's invariants over arbitrary operation
//! sequences.

use proptest::prelude::*;

use crate::cache::{CacheStore, CacheValue, EvictionPolicy, SetOptions};

// == Test Configuration ==
const TEST_MAX_SIZE: u64 = 4096;
const TEST_MAX_ENTRIES: usize = 16;
const TEST_DEFAULT_TTL_MS: u64 = 300_000;

// == Strategies ==
/// Generates valid cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop::sample::select(EvictionPolicy::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String, size: Option<u64> },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy(), prop::option::of(0u64..1500))
            .prop_map(|(key, value, size)| CacheOp::Set { key, value, size }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn apply(store: &mut CacheStore, op: CacheOp) -> Option<bool> {
    match op {
        CacheOp::Set { key, value, size } => {
            let opts = match size {
                Some(size) => SetOptions::new().size(size),
                None => SetOptions::new(),
            };
            let _ = store.set(key, value, opts);
            None
        }
        CacheOp::Get { key } => Some(store.get(&key).is_ok()),
        CacheOp::Delete { key } => {
            let _ = store.delete(&key);
            None
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Byte and count budgets hold after every operation, for every policy.
    #[test]
    fn prop_bounds_hold_after_every_operation(
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let mut store = CacheStore::new(TEST_MAX_SIZE, TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS, policy);

        for op in ops {
            apply(&mut store, op);
            prop_assert!(store.size_bytes() <= TEST_MAX_SIZE, "size {} over budget", store.size_bytes());
            prop_assert!(store.len() <= TEST_MAX_ENTRIES, "count {} over budget", store.len());
        }
    }

    // Hit/miss counters match what callers observed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(TEST_MAX_SIZE, TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS, EvictionPolicy::Lru);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match apply(&mut store, op) {
                Some(true) => expected_hits += 1,
                Some(false) => expected_misses += 1,
                None => {}
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.entries, store.len());
        prop_assert_eq!(stats.size_bytes, store.size_bytes());
    }

    // A stored value reads back unchanged before expiry.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new(TEST_MAX_SIZE, TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS, EvictionPolicy::Lru);

        store.set(key.clone(), value.clone(), SetOptions::new()).unwrap();

        prop_assert_eq!(store.get(&key).unwrap(), CacheValue::from(value));
    }

    // Overwriting keeps a single entry holding the newest value.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let mut store = CacheStore::new(TEST_MAX_SIZE, TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS, EvictionPolicy::Lru);

        store.set(key.clone(), value1, SetOptions::new()).unwrap();
        store.set(key.clone(), value2.clone(), SetOptions::new()).unwrap();

        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.size_bytes(), CacheValue::from(value2.clone()).estimated_size());
        prop_assert_eq!(store.get(&key).unwrap(), CacheValue::from(value2));
    }

    // An oversized entry never changes the store.
    #[test]
    fn prop_oversized_rejection_leaves_store_unchanged(
        ops in prop::collection::vec(cache_op_strategy(), 0..30),
        key in key_strategy(),
        excess in 1u64..10_000
    ) {
        let mut store = CacheStore::new(TEST_MAX_SIZE, TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS, EvictionPolicy::Lru);
        for op in ops {
            apply(&mut store, op);
        }
        let before = store.stats();

        let result = store.set(key, "x", SetOptions::new().size(TEST_MAX_SIZE + excess));

        prop_assert!(result.is_err());
        prop_assert_eq!(store.stats(), before);
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // When full, inserting a new key evicts the least recently used one, and a
    // read moves a key out of the eviction slot.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set("[a-z]{3,8}", 3..8),
        new_key in "[0-9]{3}"
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len();
        let mut store = CacheStore::new(TEST_MAX_SIZE * 16, capacity, TEST_DEFAULT_TTL_MS, EvictionPolicy::Lru);

        for key in &keys {
            store.set(key.clone(), format!("value_{}", key), SetOptions::new()).unwrap();
        }

        // Read the oldest key, so the second oldest becomes the victim
        store.get(&keys[0]).unwrap();
        store.set(new_key.clone(), "new", SetOptions::new()).unwrap();

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(store.entry(&keys[0]).is_some());
        prop_assert!(store.entry(&keys[1]).is_none());
        prop_assert!(store.entry(&new_key).is_some());
        for key in keys.iter().skip(2) {
            prop_assert!(store.entry(key).is_some());
        }
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error converts to a JSON body with an "error" field.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::Expired(error_msg.clone()),
            CacheError::EntryTooLarge { key: error_msg.clone(), size: 2, max: 1 },
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::CacheFull(error_msg.clone()),
            CacheError::LoadFailed(error_msg.clone()),
            CacheError::RetriesExhausted { key: error_msg.clone(), attempts: 4 },
            CacheError::Internal(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(|ct| ct.to_string());
            prop_assert!(content_type.map(|ct| ct.contains("application/json")).unwrap_or(false));

            let bytes = rt.block_on(async { to_bytes(response.into_body(), usize::MAX).await.unwrap() });
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}
