use chrono::{DateTime, Utc};
use og_core::{SendOtpReceipt, VerifyOtpOutcome};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Mobile number, separators allowed
    /// Examples: "+919876543210", "+91 98765-43210"
    #[serde(alias = "mobile")]
    #[validate(length(min = 1, max = 32, message = "Phone number must be 1-32 characters"))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(alias = "mobile")]
    #[validate(length(min = 1, max = 32, message = "Phone number must be 1-32 characters"))]
    pub phone: String,

    /// Code received by SMS
    #[serde(alias = "token")]
    #[validate(length(min = 1, max = 16, message = "OTP must be 1-16 characters"))]
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub phone: String,
    pub request_count: u32,
    pub remaining_this_hour: u32,
    pub resend_after: u64, // seconds until the next request is accepted
    pub next_request_at: DateTime<Utc>,
    pub hour_bucket: String,
    pub provider: String,
}

impl SendOtpResponse {
    pub fn from_receipt(receipt: SendOtpReceipt, resend_after: u64) -> Self {
        Self {
            message: "OTP sent successfully".to_string(),
            phone: receipt.phone,
            request_count: receipt.request_count,
            remaining_this_hour: receipt.remaining_this_hour,
            resend_after,
            next_request_at: receipt.next_request_at,
            hour_bucket: receipt.hour_bucket.to_string(),
            provider: receipt.provider,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub phone: String,
    pub verified: bool,
    /// Session issued by the provider, passed through as-is
    pub session: serde_json::Value,
    pub provider: String,
}

impl From<VerifyOtpOutcome> for VerifyOtpResponse {
    fn from(outcome: VerifyOtpOutcome) -> Self {
        Self {
            message: "OTP verified successfully".to_string(),
            phone: outcome.phone,
            verified: outcome.verified,
            session: outcome.session,
            provider: outcome.provider,
        }
    }
}
