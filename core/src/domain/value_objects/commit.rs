//! Conditional commit of an accepted OTP request.
//!
//! Stores apply an [`UpsertCondition`] atomically: the cooldown and the hourly
//! cap are re-checked at write time, and only if both still hold is the
//! phone's `last_request_at` moved forward and the bucket count incremented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::entities::rate_limit_record::{cooldown_remaining, HourBucket, RateLimitRecord};

/// Parameters of one conditional increment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCondition {
    pub phone: String,
    pub hour_bucket: HourBucket,
    /// Commit time; becomes the new `last_request_at`
    pub now: DateTime<Utc>,
    pub cooldown: Duration,
    pub hourly_cap: u32,
}

impl UpsertCondition {
    pub fn new(phone: impl Into<String>, now: DateTime<Utc>, cooldown: Duration, hourly_cap: u32) -> Self {
        Self {
            phone: phone.into(),
            hour_bucket: HourBucket::containing(now),
            now,
            cooldown,
            hourly_cap,
        }
    }

    /// Evaluate the condition against the state a store currently holds.
    ///
    /// Returns the rejection outcome, or `None` when the increment may proceed.
    pub fn rejection(
        &self,
        last_request_at: Option<DateTime<Utc>>,
        bucket_count: u32,
    ) -> Option<CommitOutcome> {
        if let Some(last) = last_request_at {
            if cooldown_remaining(last, self.now, self.cooldown).is_some() {
                return Some(CommitOutcome::CooldownActive {
                    last_request_at: last,
                });
            }
        }
        if bucket_count >= self.hourly_cap {
            return Some(CommitOutcome::QuotaReached {
                request_count: bucket_count,
            });
        }
        None
    }

    /// The record a successful commit produces from the previous bucket count
    pub fn committed_record(&self, previous_count: u32) -> RateLimitRecord {
        RateLimitRecord {
            phone: self.phone.clone(),
            hour_bucket: self.hour_bucket,
            request_count: previous_count.saturating_add(1),
            last_request_at: self.now,
        }
    }

    /// Cooldown in whole milliseconds, as stores persist it
    pub fn cooldown_millis(&self) -> i64 {
        self.cooldown.as_millis().min(i64::MAX as u128) as i64
    }
}

/// Result of a conditional increment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The request was recorded as accepted
    Committed(RateLimitRecord),
    /// Another request for the phone committed inside the cooldown window
    CooldownActive { last_request_at: DateTime<Utc> },
    /// The bucket already holds `hourly_cap` accepted requests
    QuotaReached { request_count: u32 },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn condition_at(secs: u32) -> UpsertCondition {
        UpsertCondition::new(
            "+919876543210",
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, secs).unwrap(),
            Duration::from_secs(60),
            5,
        )
    }

    #[test]
    fn test_fresh_phone_may_commit() {
        let condition = condition_at(0);
        assert!(condition.rejection(None, 0).is_none());
        let record = condition.committed_record(0);
        assert_eq!(record.request_count, 1);
        assert_eq!(record.last_request_at, condition.now);
        assert_eq!(record.hour_bucket.to_string(), "2024-03-01T10");
    }

    #[test]
    fn test_cooldown_checked_before_quota() {
        let condition = condition_at(30);
        let last = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(
            condition.rejection(Some(last), 5),
            Some(CommitOutcome::CooldownActive {
                last_request_at: last
            })
        );
    }

    #[test]
    fn test_quota_reached() {
        let condition = condition_at(59);
        let last = Utc.with_ymd_and_hms(2024, 3, 1, 9, 58, 0).unwrap();
        assert_eq!(
            condition.rejection(Some(last), 5),
            Some(CommitOutcome::QuotaReached { request_count: 5 })
        );
        assert!(condition.rejection(Some(last), 4).is_none());
    }
}
