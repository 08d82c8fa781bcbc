//! Redis counter store
//!
//! Two keys per phone, sharing a hash tag so they land in one cluster slot:
//! - `{prefix}:{<sha256>}:last` holds the latest accepted request (epoch ms)
//!   and expires when the cooldown ends.
//! - `{prefix}:{<sha256>}:count:<bucket>` is a hash with `request_count` and
//!   `last_request_at`, expiring at the end of the hour bucket.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use og_core::{CommitOutcome, HourBucket, RateLimitRecord, RateLimitStoreTrait, UpsertCondition};

use super::hash_phone;
use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

/// Re-check cooldown and cap, then record the request.
///
/// Returns `{0, count}` when committed, `{1, last_ms}` while the cooldown
/// runs, `{2, count}` when the bucket is full.
pub(crate) const COMMIT_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local cooldown = tonumber(ARGV[2])
local cap = tonumber(ARGV[3])

local last = redis.call('GET', KEYS[1])
if last and now - tonumber(last) < cooldown then
    return {1, tonumber(last)}
end

local count = tonumber(redis.call('HGET', KEYS[2], 'request_count') or '0')
if count >= cap then
    return {2, count}
end

count = redis.call('HINCRBY', KEYS[2], 'request_count', 1)
redis.call('HSET', KEYS[2], 'last_request_at', ARGV[1])
redis.call('PEXPIREAT', KEYS[2], ARGV[4])
redis.call('SET', KEYS[1], ARGV[1], 'PX', math.max(cooldown, 1))
return {0, count}
"#;

pub(crate) const OUTCOME_COMMITTED: i64 = 0;
pub(crate) const OUTCOME_COOLDOWN: i64 = 1;
pub(crate) const OUTCOME_QUOTA: i64 = 2;

/// `ARGV` of the commit script, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommitArgs {
    pub now_ms: i64,
    pub cooldown_ms: i64,
    pub cap: u32,
    pub bucket_end_ms: i64,
}

impl CommitArgs {
    pub(crate) fn from_condition(condition: &UpsertCondition) -> Self {
        Self {
            now_ms: condition.now.timestamp_millis(),
            cooldown_ms: condition.cooldown_millis(),
            cap: condition.hourly_cap,
            bucket_end_ms: condition.hour_bucket.end().timestamp_millis(),
        }
    }
}

/// Turn the script's `{outcome, value}` reply into a [`CommitOutcome`]
pub(crate) fn decode_commit(
    condition: &UpsertCondition,
    outcome: i64,
    value: i64,
) -> Result<CommitOutcome, InfrastructureError> {
    match outcome {
        OUTCOME_COMMITTED => {
            let count = to_count(value)?;
            if count == 0 {
                return Err(InfrastructureError::Corrupt(
                    "Commit script reported a zero count".to_string(),
                ));
            }
            Ok(CommitOutcome::Committed(condition.committed_record(count - 1)))
        }
        OUTCOME_COOLDOWN => Ok(CommitOutcome::CooldownActive {
            last_request_at: from_millis(value)?,
        }),
        OUTCOME_QUOTA => Ok(CommitOutcome::QuotaReached {
            request_count: to_count(value)?,
        }),
        other => Err(InfrastructureError::Corrupt(format!(
            "Unexpected commit script outcome {}",
            other
        ))),
    }
}

fn to_count(value: i64) -> Result<u32, InfrastructureError> {
    u32::try_from(value)
        .map_err(|_| InfrastructureError::Corrupt(format!("Invalid request count {}", value)))
}

/// Redis implementation of the counter store
pub struct RedisRateLimitStore {
    redis_client: Arc<RedisClient>,
    commit_script: redis::Script,
}

impl RedisRateLimitStore {
    /// Create a new Redis-backed counter store
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self {
            redis_client,
            commit_script: redis::Script::new(COMMIT_SCRIPT),
        }
    }

    fn last_key(&self, phone: &str) -> String {
        self.redis_client
            .make_key(&format!("{{{}}}:last", hash_phone(phone)))
    }

    fn count_key(&self, phone: &str, bucket: HourBucket) -> String {
        self.redis_client
            .make_key(&format!("{{{}}}:count:{}", hash_phone(phone), bucket))
    }

    async fn read(
        &self,
        phone: &str,
        bucket: HourBucket,
    ) -> Result<Option<RateLimitRecord>, InfrastructureError> {
        let last_key = self.last_key(phone);
        let count_key = self.count_key(phone, bucket);

        let (last_ms, count, bucket_last_ms): (Option<i64>, Option<u32>, Option<i64>) = self
            .redis_client
            .execute_with_retry(|mut conn| {
                let last_key = last_key.clone();
                let count_key = count_key.clone();
                Box::pin(async move {
                    redis::pipe()
                        .get(&last_key)
                        .hget(&count_key, "request_count")
                        .hget(&count_key, "last_request_at")
                        .query_async(&mut conn)
                        .await
                })
            })
            .await?;

        let Some(last_ms) = last_ms.or(bucket_last_ms) else {
            return Ok(None);
        };

        Ok(Some(RateLimitRecord {
            phone: phone.to_string(),
            hour_bucket: bucket,
            request_count: count.unwrap_or(0),
            last_request_at: from_millis(last_ms)?,
        }))
    }

    async fn commit(&self, condition: &UpsertCondition) -> Result<CommitOutcome, InfrastructureError> {
        let last_key = self.last_key(&condition.phone);
        let count_key = self.count_key(&condition.phone, condition.hour_bucket);
        let args = CommitArgs::from_condition(condition);

        // Single attempt: after a lost reply the increment may already be applied
        let mut conn = self.redis_client.get_connection();
        let (outcome, value): (i64, i64) = self
            .commit_script
            .key(last_key)
            .key(count_key)
            .arg(args.now_ms)
            .arg(args.cooldown_ms)
            .arg(args.cap)
            .arg(args.bucket_end_ms)
            .invoke_async(&mut conn)
            .await?;

        debug!(outcome, value, hour_bucket = %condition.hour_bucket, "Commit script finished");

        decode_commit(condition, outcome, value)
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, InfrastructureError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| InfrastructureError::Corrupt(format!("Invalid timestamp {}", ms)))
}

#[async_trait]
impl RateLimitStoreTrait for RedisRateLimitStore {
    async fn get(&self, phone: &str, bucket: HourBucket) -> Result<Option<RateLimitRecord>, String> {
        self.read(phone, bucket).await.map_err(|e| e.to_string())
    }

    async fn conditional_upsert(&self, condition: &UpsertCondition) -> Result<CommitOutcome, String> {
        self.commit(condition).await.map_err(|e| e.to_string())
    }

    // Keys carry their own expiry; nothing to purge.

    async fn health_check(&self) -> Result<(), String> {
        match self.redis_client.health_check().await {
            Ok(true) => Ok(()),
            Ok(false) => Err("Redis returned an unexpected PING response".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
