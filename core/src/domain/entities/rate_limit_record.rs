//! Rate-limit record entity and the UTC hour buckets that partition quota counts.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering of an hour bucket, e.g. `2024-03-01T10`
pub const HOUR_BUCKET_FORMAT: &str = "%Y-%m-%dT%H";

/// A wall-clock UTC hour used as the partition key for quota counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HourBucket(DateTime<Utc>);

impl HourBucket {
    /// The bucket that contains `now`
    pub fn containing(now: DateTime<Utc>) -> Self {
        let start = now
            - Duration::minutes(i64::from(now.minute()))
            - Duration::seconds(i64::from(now.second()))
            - Duration::nanoseconds(i64::from(now.nanosecond()));
        Self(start)
    }

    /// First instant of the bucket
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    /// First instant after the bucket
    pub fn end(&self) -> DateTime<Utc> {
        self.0 + Duration::hours(1)
    }

    /// Whole seconds from `now` until the bucket ends, rounded up
    pub fn seconds_until_end(&self, now: DateTime<Utc>) -> u64 {
        ceil_seconds(self.end() - now)
    }

    /// Whether the bucket has ended at `now`
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end()
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(HOUR_BUCKET_FORMAT))
    }
}

impl FromStr for HourBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(&format!("{}:00:00Z", s.trim()))
            .map_err(|e| format!("Invalid hour bucket '{}': {}", s, e))?;
        Ok(Self::containing(parsed.with_timezone(&Utc)))
    }
}

impl From<HourBucket> for String {
    fn from(bucket: HourBucket) -> Self {
        bucket.to_string()
    }
}

impl TryFrom<String> for HourBucket {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Round a duration up to whole seconds, clamping negatives to zero
pub fn ceil_seconds(duration: Duration) -> u64 {
    if duration <= Duration::zero() {
        return 0;
    }
    match duration.num_nanoseconds() {
        Some(nanos) => ((nanos + 999_999_999) / 1_000_000_000) as u64,
        // Nanoseconds overflow past ~292 years
        None => ((duration.num_milliseconds() + 999) / 1000) as u64,
    }
}

/// Per-phone request counter for one hour bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    /// Normalized phone number
    pub phone: String,

    /// Hour bucket the count belongs to
    pub hour_bucket: HourBucket,

    /// Accepted requests within `hour_bucket`
    pub request_count: u32,

    /// The phone's most recent accepted request, across buckets
    pub last_request_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Record for the first accepted request in a bucket
    pub fn first(phone: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            phone: phone.into(),
            hour_bucket: HourBucket::containing(now),
            request_count: 1,
            last_request_at: now,
        }
    }

    /// Time left in the cooldown window at `now`, or `None` once it has elapsed.
    ///
    /// A `last_request_at` ahead of `now` (clock skew between instances)
    /// never yields more than the full cooldown.
    pub fn cooldown_remaining(
        &self,
        now: DateTime<Utc>,
        cooldown: std::time::Duration,
    ) -> Option<Duration> {
        cooldown_remaining(self.last_request_at, now, cooldown)
    }

    /// Whether another request fits under `cap` in this bucket
    pub fn has_quota(&self, cap: u32) -> bool {
        self.request_count < cap
    }
}

/// Cooldown left after a request at `last_request_at`
pub(crate) fn cooldown_remaining(
    last_request_at: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown: std::time::Duration,
) -> Option<Duration> {
    let cooldown = Duration::milliseconds(cooldown.as_millis().min(i64::MAX as u128) as i64);
    let remaining = (cooldown - (now - last_request_at)).min(cooldown);
    if remaining > Duration::zero() {
        Some(remaining)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_bucket_truncates_to_hour() {
        let now = at(10, 59, 59) + Duration::milliseconds(999);
        let bucket = HourBucket::containing(now);
        assert_eq!(bucket.start(), at(10, 0, 0));
        assert_eq!(bucket.end(), at(11, 0, 0));
        assert_eq!(bucket.to_string(), "2024-03-01T10");
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(HourBucket::containing(at(11, 0, 0)).to_string(), "2024-03-01T11");
        assert_ne!(
            HourBucket::containing(at(10, 59, 59)),
            HourBucket::containing(at(11, 0, 5))
        );
        assert!(HourBucket::containing(at(10, 30, 0)).has_ended(at(11, 0, 0)));
    }

    #[test]
    fn test_seconds_until_end_rounds_up() {
        let bucket = HourBucket::containing(at(10, 0, 0));
        assert_eq!(bucket.seconds_until_end(at(10, 59, 59)), 1);
        assert_eq!(
            bucket.seconds_until_end(at(10, 59, 58) + Duration::milliseconds(1)),
            2
        );
        assert_eq!(bucket.seconds_until_end(at(11, 0, 0)), 0);
    }

    #[test]
    fn test_bucket_parse_and_serde() {
        let bucket: HourBucket = "2024-03-01T10".parse().unwrap();
        assert_eq!(bucket.start(), at(10, 0, 0));
        assert!("2024-03-01".parse::<HourBucket>().is_err());

        let json = serde_json::to_string(&bucket).unwrap();
        assert_eq!(json, "\"2024-03-01T10\"");
        let back: HourBucket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bucket);
    }

    #[test]
    fn test_cooldown_remaining() {
        let record = RateLimitRecord::first("+919876543210", at(10, 0, 0));
        let cooldown = std::time::Duration::from_secs(60);

        let remaining = record.cooldown_remaining(at(10, 0, 10), cooldown).unwrap();
        assert_eq!(ceil_seconds(remaining), 50);
        assert!(record.cooldown_remaining(at(10, 1, 0), cooldown).is_none());

        // Clock skew never extends the wait beyond the cooldown
        let skewed = record.cooldown_remaining(at(9, 59, 0), cooldown).unwrap();
        assert_eq!(ceil_seconds(skewed), 60);
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let record = RateLimitRecord::first("+919876543210", at(10, 0, 0));
        assert!(record
            .cooldown_remaining(at(10, 0, 0), std::time::Duration::ZERO)
            .is_none());
    }

    #[test]
    fn test_has_quota() {
        let mut record = RateLimitRecord::first("+919876543210", at(10, 0, 0));
        assert!(record.has_quota(5));
        record.request_count = 5;
        assert!(!record.has_quota(5));
    }

    #[test]
    fn test_ceil_seconds() {
        assert_eq!(ceil_seconds(Duration::milliseconds(1)), 1);
        assert_eq!(ceil_seconds(Duration::seconds(50)), 50);
        assert_eq!(ceil_seconds(Duration::seconds(-3)), 0);
    }

    #[test]
    fn test_ceil_seconds_sub_millisecond_remainder() {
        assert_eq!(ceil_seconds(Duration::microseconds(500)), 1);
        assert_eq!(ceil_seconds(Duration::nanoseconds(1)), 1);
        assert_eq!(ceil_seconds(Duration::seconds(2) + Duration::nanoseconds(1)), 3);
        assert_eq!(ceil_seconds(Duration::zero()), 0);
    }
}
