//! Main OTP gate implementation

use chrono::Duration as ChronoDuration;
use og_shared::phone::{is_valid_phone, mask_phone_number, normalize_phone_number};
use std::sync::Arc;

use crate::domain::entities::{ceil_seconds, HourBucket};
use crate::domain::value_objects::{CommitOutcome, UpsertCondition};
use crate::errors::{OtpError, OtpResult};

use super::clock::{Clock, SystemClock};
use super::config::GateConfig;
use super::traits::{OtpProviderTrait, ProviderVerification, RateLimitStoreTrait};
use super::types::{SendOtpReceipt, VerifyOtpOutcome};

const DEFAULT_VERIFICATION_MESSAGE: &str = "Invalid OTP";

/// Gate in front of the SMS provider enforcing a per-phone cooldown and hourly quota
pub struct OtpGate {
    /// Counter store holding all rate-limit state
    store: Arc<dyn RateLimitStoreTrait>,
    /// Provider that delivers and verifies OTPs
    provider: Arc<dyn OtpProviderTrait>,
    clock: Arc<dyn Clock>,
    config: GateConfig,
}

impl OtpGate {
    /// Create a new gate using the system clock
    ///
    /// # Arguments
    ///
    /// * `store` - Counter store implementation
    /// * `provider` - SMS/auth provider implementation
    /// * `config` - Cooldown, cap, timeout and phone region
    pub fn new(
        store: Arc<dyn RateLimitStoreTrait>,
        provider: Arc<dyn OtpProviderTrait>,
        config: GateConfig,
    ) -> Self {
        Self {
            store,
            provider,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Request an OTP for a phone number
    ///
    /// This method:
    /// 1. Normalizes and validates the phone number (no store access on failure)
    /// 2. Rejects the request while the phone's cooldown is running
    /// 3. Rejects the request once the hour bucket holds `hourly_cap` requests
    /// 4. Dispatches the OTP through the provider, bounded by the provider timeout
    /// 5. Commits the request with an atomic re-check of cooldown and cap
    ///
    /// Counters only advance after the provider accepted the request.
    pub async fn request_otp(&self, phone: &str) -> OtpResult<SendOtpReceipt> {
        let phone = self.validate_phone(phone)?;
        let masked = mask_phone_number(&phone);

        let now = self.clock.now();
        let bucket = HourBucket::containing(now);

        let record = self
            .store
            .get(&phone, bucket)
            .await
            .map_err(|e| self.store_error(&masked, "read", e))?;

        if let Some(record) = &record {
            if let Some(remaining) = record.cooldown_remaining(now, self.config.cooldown) {
                let retry_after_seconds = ceil_seconds(remaining);
                tracing::warn!(
                    phone = %masked,
                    retry_after_seconds,
                    event = "rate_limit_exceeded",
                    "OTP requested inside cooldown window"
                );
                return Err(OtpError::RateLimited {
                    retry_after_seconds,
                });
            }
        }

        let count = record.as_ref().map_or(0, |r| r.request_count);
        if count >= self.config.hourly_cap {
            let retry_after_seconds = bucket.seconds_until_end(now);
            tracing::warn!(
                phone = %masked,
                hour_bucket = %bucket,
                request_count = count,
                cap = self.config.hourly_cap,
                retry_after_seconds,
                event = "quota_exceeded",
                "Hourly OTP quota exhausted"
            );
            return Err(OtpError::QuotaExceeded {
                cap: self.config.hourly_cap,
                retry_after_seconds,
            });
        }

        self.dispatch(&phone, &masked).await?;

        let committed_at = self.clock.now();
        let condition = UpsertCondition::new(
            phone.clone(),
            committed_at,
            self.config.cooldown,
            self.config.hourly_cap,
        );

        let outcome = self
            .store
            .conditional_upsert(&condition)
            .await
            .map_err(|e| self.store_error(&masked, "commit", e))?;

        match outcome {
            CommitOutcome::Committed(record) => {
                let next_request_at = record.last_request_at
                    + ChronoDuration::milliseconds(condition.cooldown_millis());
                tracing::info!(
                    phone = %masked,
                    hour_bucket = %record.hour_bucket,
                    request_count = record.request_count,
                    provider = self.provider.provider_name(),
                    event = "otp_dispatched",
                    "OTP dispatched"
                );
                Ok(SendOtpReceipt {
                    remaining_this_hour: self.config.hourly_cap.saturating_sub(record.request_count),
                    phone: record.phone,
                    hour_bucket: record.hour_bucket,
                    request_count: record.request_count,
                    next_request_at,
                    provider: self.provider.provider_name().to_string(),
                })
            }
            CommitOutcome::CooldownActive { last_request_at } => {
                let remaining = ChronoDuration::milliseconds(condition.cooldown_millis())
                    - (committed_at - last_request_at);
                let retry_after_seconds = ceil_seconds(remaining).max(1);
                tracing::warn!(
                    phone = %masked,
                    retry_after_seconds,
                    event = "commit_race_lost",
                    "Concurrent request committed first; OTP was dispatched but not counted"
                );
                Err(OtpError::RateLimited {
                    retry_after_seconds,
                })
            }
            CommitOutcome::QuotaReached { request_count } => {
                let retry_after_seconds = condition.hour_bucket.seconds_until_end(committed_at);
                tracing::warn!(
                    phone = %masked,
                    hour_bucket = %condition.hour_bucket,
                    request_count,
                    event = "commit_race_lost",
                    "Concurrent requests filled the hourly quota; OTP was dispatched but not counted"
                );
                Err(OtpError::QuotaExceeded {
                    cap: self.config.hourly_cap,
                    retry_after_seconds,
                })
            }
        }
    }

    /// Verify an OTP with the provider
    ///
    /// Verification never reads or writes rate-limit counters.
    pub async fn verify_otp(&self, phone: &str, token: &str) -> OtpResult<VerifyOtpOutcome> {
        let phone = self.validate_phone(phone)?;
        let token = token.trim();
        if !(4..=8).contains(&token.len()) || !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::invalid_otp("OTP must be 4 to 8 digits"));
        }
        let masked = mask_phone_number(&phone);

        let verification = tokio::time::timeout(
            self.config.provider_timeout,
            self.provider.verify_otp(&phone, token),
        )
        .await
        .map_err(|_| self.provider_timeout(&masked))?
        .map_err(|message| {
            tracing::error!(
                phone = %masked,
                error = %message,
                event = "provider_failure",
                "OTP verification call failed"
            );
            OtpError::Provider { message }
        })?;

        match verification {
            ProviderVerification::Verified { session } => {
                tracing::info!(phone = %masked, event = "otp_verified", "OTP verified");
                Ok(VerifyOtpOutcome {
                    phone,
                    verified: true,
                    session,
                    provider: self.provider.provider_name().to_string(),
                })
            }
            ProviderVerification::Rejected { message } => {
                tracing::info!(
                    phone = %masked,
                    event = "otp_rejected",
                    "Provider rejected OTP"
                );
                let message = if message.trim().is_empty() {
                    DEFAULT_VERIFICATION_MESSAGE.to_string()
                } else {
                    message
                };
                Err(OtpError::VerificationFailed { message })
            }
        }
    }

    /// Reachability of the counter store
    pub async fn store_health(&self) -> Result<(), String> {
        self.store.health_check().await
    }

    fn validate_phone(&self, raw: &str) -> OtpResult<String> {
        let phone = normalize_phone_number(raw);
        if phone.is_empty() {
            return Err(OtpError::invalid_phone("Phone number is required"));
        }
        if !is_valid_phone(&phone, self.config.phone_region) {
            tracing::debug!(
                phone = %mask_phone_number(&phone),
                region = %self.config.phone_region,
                event = "invalid_phone",
                "Rejected malformed phone number"
            );
            return Err(OtpError::invalid_phone(self.config.phone_region.format_hint()));
        }
        Ok(phone)
    }

    async fn dispatch(&self, phone: &str, masked: &str) -> OtpResult<()> {
        match tokio::time::timeout(self.config.provider_timeout, self.provider.send_otp(phone)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => {
                tracing::error!(
                    phone = %masked,
                    provider = self.provider.provider_name(),
                    error = %message,
                    event = "provider_failure",
                    "OTP dispatch failed"
                );
                Err(OtpError::Provider { message })
            }
            Err(_) => Err(self.provider_timeout(masked)),
        }
    }

    fn provider_timeout(&self, masked: &str) -> OtpError {
        tracing::error!(
            phone = %masked,
            provider = self.provider.provider_name(),
            timeout_ms = self.config.provider_timeout.as_millis() as u64,
            event = "provider_timeout",
            "Provider call timed out"
        );
        OtpError::Provider {
            message: format!(
                "Provider did not respond within {} ms",
                self.config.provider_timeout.as_millis()
            ),
        }
    }

    fn store_error(&self, masked: &str, operation: &str, message: String) -> OtpError {
        tracing::error!(
            phone = %masked,
            backend = self.store.backend_name(),
            operation,
            error = %message,
            event = "store_failure",
            "Rate limit store unavailable; failing closed"
        );
        OtpError::Store { message }
    }
}
