//! Integration tests for the Redis counter store
//!
//! These tests require Redis to be running locally on port 6379.
//! Run with: cargo test --test redis_store_integration -- --ignored

use chrono::{Duration, Utc};
use og_core::{CommitOutcome, HourBucket, RateLimitStoreTrait, UpsertCondition};
use og_infra::cache::RedisClient;
use og_infra::store::RedisRateLimitStore;
use og_shared::CacheConfig;
use std::sync::Arc;
use std::time::Duration as StdDuration;

async fn create_test_store() -> RedisRateLimitStore {
    let config = CacheConfig::new("redis://localhost:6379")
        .with_prefix(format!("otp_rate_test_{}", rand::random::<u32>()));
    let client = RedisClient::new(config)
        .await
        .expect("Failed to create Redis client");
    RedisRateLimitStore::new(Arc::new(client))
}

fn random_phone() -> String {
    format!("+9198{:08}", rand::random::<u32>() % 100_000_000)
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_commit_and_read_back() {
    let store = create_test_store().await;
    let phone = random_phone();
    let now = Utc::now();
    let bucket = HourBucket::containing(now);

    assert!(store.get(&phone, bucket).await.unwrap().is_none());

    let outcome = store
        .conditional_upsert(&UpsertCondition::new(phone.clone(), now, StdDuration::from_secs(60), 5))
        .await
        .unwrap();
    assert!(outcome.is_committed());

    let record = store.get(&phone, bucket).await.unwrap().unwrap();
    assert_eq!(record.request_count, 1);
    assert_eq!(record.last_request_at.timestamp_millis(), now.timestamp_millis());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_script_enforces_cooldown() {
    let store = create_test_store().await;
    let phone = random_phone();
    let now = Utc::now();
    let cooldown = StdDuration::from_secs(60);

    store
        .conditional_upsert(&UpsertCondition::new(phone.clone(), now, cooldown, 5))
        .await
        .unwrap();
    let outcome = store
        .conditional_upsert(&UpsertCondition::new(
            phone.clone(),
            now + Duration::seconds(10),
            cooldown,
            5,
        ))
        .await
        .unwrap();

    assert!(matches!(outcome, CommitOutcome::CooldownActive { .. }));
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_concurrent_commits_respect_cap() {
    let store = Arc::new(create_test_store().await);
    let phone = random_phone();
    let now = Utc::now();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            let phone = phone.clone();
            tokio::spawn(async move {
                store
                    .conditional_upsert(&UpsertCondition::new(phone, now, StdDuration::ZERO, 3))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        if handle.await.unwrap().is_committed() {
            committed += 1;
        }
    }
    assert_eq!(committed, 3);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_health_check() {
    let store = create_test_store().await;
    assert!(store.health_check().await.is_ok());
}
