//! Process-local counter store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::time::Duration;

use og_core::{CommitOutcome, HourBucket, RateLimitRecord, RateLimitStoreTrait, UpsertCondition};

/// Per-phone state: latest accepted request and counts per hour bucket
#[derive(Debug, Clone)]
struct PhoneState {
    last_request_at: DateTime<Utc>,
    buckets: BTreeMap<HourBucket, u32>,
}

/// In-memory counter store backed by a sharded concurrent map
///
/// A conditional upsert holds the shard lock of its phone for the duration
/// of the check and increment. Limits are not shared across processes.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: DashMap<String, PhoneState>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of phones currently tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RateLimitStoreTrait for InMemoryRateLimitStore {
    async fn get(&self, phone: &str, bucket: HourBucket) -> Result<Option<RateLimitRecord>, String> {
        Ok(self.entries.get(phone).map(|state| RateLimitRecord {
            phone: phone.to_string(),
            hour_bucket: bucket,
            request_count: state.buckets.get(&bucket).copied().unwrap_or(0),
            last_request_at: state.last_request_at,
        }))
    }

    async fn conditional_upsert(&self, condition: &UpsertCondition) -> Result<CommitOutcome, String> {
        match self.entries.entry(condition.phone.clone()) {
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                let count = state
                    .buckets
                    .get(&condition.hour_bucket)
                    .copied()
                    .unwrap_or(0);
                if let Some(rejection) = condition.rejection(Some(state.last_request_at), count) {
                    return Ok(rejection);
                }
                state.buckets.retain(|bucket, _| !bucket.has_ended(condition.now));
                state.buckets.insert(condition.hour_bucket, count + 1);
                state.last_request_at = condition.now;
                Ok(CommitOutcome::Committed(condition.committed_record(count)))
            }
            Entry::Vacant(vacant) => {
                if let Some(rejection) = condition.rejection(None, 0) {
                    return Ok(rejection);
                }
                let mut buckets = BTreeMap::new();
                buckets.insert(condition.hour_bucket, 1);
                vacant.insert(PhoneState {
                    last_request_at: condition.now,
                    buckets,
                });
                Ok(CommitOutcome::Committed(condition.committed_record(0)))
            }
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>, cooldown: Duration) -> Result<usize, String> {
        let cooldown = chrono::Duration::from_std(cooldown).map_err(|e| e.to_string())?;
        let mut purged = 0;

        self.entries.retain(|_, state| {
            let before = state.buckets.len();
            state.buckets.retain(|bucket, _| !bucket.has_ended(now));
            purged += before - state.buckets.len();
            !state.buckets.is_empty() || now - state.last_request_at < cooldown
        });

        Ok(purged)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
