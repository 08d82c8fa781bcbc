//! Tests for the Redis commit script arguments and reply decoding

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

use og_core::{CommitOutcome, UpsertCondition};

use crate::store::redis_store::{
    decode_commit, CommitArgs, COMMIT_SCRIPT, OUTCOME_COMMITTED, OUTCOME_COOLDOWN, OUTCOME_QUOTA,
};
use crate::InfrastructureError;

const PHONE: &str = "+919876543210";

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
}

fn condition(now: DateTime<Utc>) -> UpsertCondition {
    UpsertCondition::new(PHONE, now, Duration::from_secs(60), 5)
}

#[test]
fn test_args_follow_condition() {
    let args = CommitArgs::from_condition(&condition(at(10, 15, 0)));

    assert_eq!(args.now_ms, at(10, 15, 0).timestamp_millis());
    assert_eq!(args.cooldown_ms, 60_000);
    assert_eq!(args.cap, 5);
    assert_eq!(args.bucket_end_ms, at(11, 0, 0).timestamp_millis());
}

#[test]
fn test_committed_reply_becomes_record() {
    let condition = condition(at(10, 15, 0));

    let outcome = decode_commit(&condition, OUTCOME_COMMITTED, 3).unwrap();

    let CommitOutcome::Committed(record) = outcome else {
        panic!("expected a committed outcome, got {outcome:?}");
    };
    assert_eq!(record.phone, PHONE);
    assert_eq!(record.request_count, 3);
    assert_eq!(record.last_request_at, at(10, 15, 0));
    assert_eq!(record.hour_bucket, condition.hour_bucket);
}

#[test]
fn test_cooldown_reply_carries_last_request() {
    let last = at(10, 14, 30);

    let outcome =
        decode_commit(&condition(at(10, 15, 0)), OUTCOME_COOLDOWN, last.timestamp_millis()).unwrap();

    assert_eq!(outcome, CommitOutcome::CooldownActive { last_request_at: last });
}

#[test]
fn test_quota_reply_carries_count() {
    let outcome = decode_commit(&condition(at(10, 15, 0)), OUTCOME_QUOTA, 5).unwrap();
    assert_eq!(outcome, CommitOutcome::QuotaReached { request_count: 5 });
}

#[test]
fn test_unexpected_replies_are_corrupt() {
    let condition = condition(at(10, 15, 0));

    for (outcome, value) in [(7, 1), (OUTCOME_COMMITTED, 0), (OUTCOME_COMMITTED, -1), (OUTCOME_QUOTA, -4)] {
        let result = decode_commit(&condition, outcome, value);
        assert!(
            matches!(result, Err(InfrastructureError::Corrupt(_))),
            "({outcome}, {value}) decoded as {result:?}"
        );
    }
}

#[test]
fn test_script_checks_before_writing() {
    let position = |needle: &str| {
        COMMIT_SCRIPT
            .find(needle)
            .unwrap_or_else(|| panic!("script is missing {needle}"))
    };

    // Cooldown, then cap, then the writes
    assert!(position("redis.call('GET', KEYS[1])") < position("'HGET'"));
    assert!(position("count >= cap") < position("'HINCRBY'"));
    assert!(position("'HINCRBY'") < position("'SET', KEYS[1]"));

    // Both keys expire on their own
    assert!(COMMIT_SCRIPT.contains("'PEXPIREAT', KEYS[2], ARGV[4]"));
    assert!(COMMIT_SCRIPT.contains("'PX', math.max(cooldown, 1)"));
}
