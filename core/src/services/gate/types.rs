//! Types for gate results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::HourBucket;

/// Result of an accepted OTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpReceipt {
    /// Normalized phone number
    pub phone: String,
    /// Bucket the request was counted in
    pub hour_bucket: HourBucket,
    /// Accepted requests in the bucket, including this one
    pub request_count: u32,
    /// Requests left before the hourly cap
    pub remaining_this_hour: u32,
    /// Earliest time the next request can be accepted
    pub next_request_at: DateTime<Utc>,
    /// Provider that dispatched the OTP
    pub provider: String,
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpOutcome {
    pub phone: String,
    pub verified: bool,
    /// Session payload from the provider, passed through untouched
    pub session: serde_json::Value,
    pub provider: String,
}
