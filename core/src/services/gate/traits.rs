//! Traits for counter store and SMS provider integration

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::entities::{HourBucket, RateLimitRecord};
use crate::domain::value_objects::{CommitOutcome, UpsertCondition};

/// Trait for the store that holds per-phone rate-limit counters
#[async_trait]
pub trait RateLimitStoreTrait: Send + Sync {
    /// Record for `bucket`, carrying the phone's latest `last_request_at`.
    ///
    /// A phone with a recent request but nothing in `bucket` yields a record
    /// with `request_count = 0`; an unknown phone yields `None`.
    async fn get(&self, phone: &str, bucket: HourBucket) -> Result<Option<RateLimitRecord>, String>;

    /// Atomically re-check cooldown and cap, then record an accepted request
    async fn conditional_upsert(&self, condition: &UpsertCondition) -> Result<CommitOutcome, String>;

    /// Delete records whose bucket has ended and whose cooldown has elapsed
    async fn purge_expired(&self, _now: DateTime<Utc>, _cooldown: Duration) -> Result<usize, String> {
        Ok(0)
    }

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Provider answer to a verification attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderVerification {
    /// Code accepted; carries the provider's session payload
    Verified { session: serde_json::Value },
    /// Code wrong or expired
    Rejected { message: String },
}

/// Trait for the external SMS/auth provider
#[async_trait]
pub trait OtpProviderTrait: Send + Sync {
    /// Ask the provider to deliver an OTP to `phone`
    async fn send_otp(&self, phone: &str) -> Result<(), String>;
    /// Check `token` against the OTP the provider delivered to `phone`
    async fn verify_otp(&self, phone: &str, token: &str) -> Result<ProviderVerification, String>;
    /// Provider name for logs and receipts
    fn provider_name(&self) -> &str;
}
