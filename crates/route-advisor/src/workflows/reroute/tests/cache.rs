use std::sync::Arc;
use std::time::Duration;

use crate::workflows::reroute::cache::{PredictionCache, DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::workflows::reroute::domain::RiskBreakdown;

#[tokio::test(start_paused = true)]
async fn hundred_and_first_entry_evicts_the_oldest() {
    let cache = PredictionCache::default();
    assert_eq!(cache.capacity(), DEFAULT_CAPACITY);

    for index in 0..100 {
        cache.insert(format!("shipment-{index}"), index);
        tokio::time::advance(Duration::from_millis(10)).await;
    }
    assert_eq!(cache.len(), 100);

    cache.insert("shipment-100", 100);

    assert_eq!(cache.len(), 100);
    assert_eq!(cache.get("shipment-0"), None);
    assert_eq!(cache.get("shipment-1"), Some(1));
    assert_eq!(cache.get("shipment-100"), Some(100));
}

#[tokio::test(start_paused = true)]
async fn eviction_ignores_remaining_ttl() {
    let cache = PredictionCache::new(2, DEFAULT_TTL).expect("valid cache");
    cache.put("long-lived", 1, Duration::from_secs(3_600));
    tokio::time::advance(Duration::from_secs(1)).await;
    cache.put("short-lived", 2, Duration::from_secs(5));

    cache.insert("newest", 3);

    assert_eq!(cache.get("long-lived"), None);
    assert_eq!(cache.get("short-lived"), Some(2));
}

#[tokio::test(start_paused = true)]
async fn same_instant_inserts_evict_in_insertion_order() {
    let cache = PredictionCache::new(3, DEFAULT_TTL).expect("valid cache");
    cache.insert("a", 1);
    cache.insert("b", 2);
    cache.insert("c", 3);

    cache.insert("d", 4);

    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_removed_on_get() {
    let cache = PredictionCache::new(10, DEFAULT_TTL).expect("valid cache");
    cache.insert("route-a", RiskBreakdown::from_prediction(0.4));
    assert_eq!(cache.len(), 1);

    tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;

    assert!(cache.get("route-a").is_none());
    assert_eq!(cache.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn purge_drops_only_expired_entries() {
    let cache = PredictionCache::new(10, DEFAULT_TTL).expect("valid cache");
    cache.put("short", 1, Duration::from_secs(5));
    cache.put("long", 2, Duration::from_secs(500));

    tokio::time::advance(Duration::from_secs(6)).await;

    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("long"), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_access_keeps_the_cache_consistent() {
    let cache = Arc::new(PredictionCache::new(50, DEFAULT_TTL).expect("valid cache"));

    let mut handles = Vec::new();
    for worker in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for index in 0..200 {
                let key = format!("k-{}", (worker * 200 + index) % 75);
                if cache.get(&key).is_none() {
                    cache.insert(key, index);
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker completes");
    }

    assert!(cache.len() <= 50);
    assert!(!cache.is_empty());
}
