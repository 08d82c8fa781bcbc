//! Rate limiting configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::env_or;

/// Per-phone OTP rate limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two accepted OTP requests for one phone
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    /// Max accepted OTP requests per phone per UTC hour
    #[serde(default = "default_per_phone_per_hour")]
    pub per_phone_per_hour: u32,

    /// How often expired counter records are purged, in seconds (0 disables)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            per_phone_per_hour: default_per_phone_per_hour(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            cooldown_seconds: env_or("OTP_COOLDOWN_SECONDS", default_cooldown_seconds()),
            per_phone_per_hour: env_or("OTP_HOURLY_CAP", default_per_phone_per_hour()),
            cleanup_interval_seconds: env_or(
                "OTP_CLEANUP_INTERVAL_SECONDS",
                default_cleanup_interval(),
            ),
        }
    }

    /// Cooldown as a `Duration`
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Cleanup cadence, `None` when cleanup is disabled
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_seconds > 0)
            .then(|| Duration::from_secs(self.cleanup_interval_seconds))
    }

    /// Reject limits that would make the gate useless
    pub fn validate(&self) -> Result<(), String> {
        if self.per_phone_per_hour == 0 {
            return Err("OTP_HOURLY_CAP must be at least 1".to_string());
        }
        if self.cooldown_seconds >= 3600 && self.per_phone_per_hour > 1 {
            return Err(format!(
                "OTP_COOLDOWN_SECONDS ({}) leaves room for at most one request per hour, \
                 but OTP_HOURLY_CAP is {}",
                self.cooldown_seconds, self.per_phone_per_hour
            ));
        }
        Ok(())
    }
}

fn default_cooldown_seconds() -> u64 {
    60
}

fn default_per_phone_per_hour() -> u32 {
    5
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}
