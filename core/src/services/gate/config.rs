//! Configuration for the OTP gate

use og_shared::{AppConfig, PhoneRegion};
use std::time::Duration;

/// Configuration for the OTP gate
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum time between two accepted requests for one phone
    pub cooldown: Duration,
    /// Maximum accepted requests per phone per UTC hour
    pub hourly_cap: u32,
    /// Upper bound on a single provider call
    pub provider_timeout: Duration,
    /// Which phone numbers are accepted
    pub phone_region: PhoneRegion,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            hourly_cap: 5,
            provider_timeout: Duration::from_secs(10),
            phone_region: PhoneRegion::India,
        }
    }
}

impl GateConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            cooldown: config.rate_limit.cooldown(),
            hourly_cap: config.rate_limit.per_phone_per_hour,
            provider_timeout: config.provider.timeout(),
            phone_region: config.phone_region,
        }
    }
}
