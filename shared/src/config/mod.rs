//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Counter store backend selection and Redis configuration
//! - `database` - MySQL connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `provider` - SMS/auth provider selection and credentials
//! - `rate_limit` - Per-phone cooldown and hourly quota
//! - `server` - HTTP server and CORS configuration

pub mod cache;
pub mod database;
pub mod environment;
pub mod provider;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::phone::PhoneRegion;

// Re-export commonly used types
pub use cache::{CacheConfig, StoreBackend};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use provider::{ProviderConfig, ProviderKind};
pub use rate_limit::RateLimitConfig;
pub use server::{CorsConfig, ServerConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// OTP rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Accepted phone number region
    #[serde(default)]
    pub phone_region: PhoneRegion,

    /// Which counter store backs the gate
    #[serde(default)]
    pub store: StoreBackend,

    /// Redis configuration (used by the `redis` store)
    pub cache: CacheConfig,

    /// Database configuration (used by the `mysql` store)
    pub database: DatabaseConfig,

    /// SMS/auth provider configuration
    pub provider: ProviderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            phone_region: PhoneRegion::default(),
            store: StoreBackend::default(),
            cache: CacheConfig::default(),
            database: DatabaseConfig::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            phone_region: env_or("OTP_PHONE_REGION", PhoneRegion::default()),
            store: env_or("STORE_BACKEND", StoreBackend::default()),
            cache: CacheConfig::from_env(),
            database: DatabaseConfig::from_env(),
            provider: ProviderConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }

    /// Check the configuration for values the service cannot run with
    pub fn validate(&self) -> Result<(), String> {
        self.rate_limit.validate()?;
        self.provider.validate(self.environment)?;
        if self.server.port == 0 {
            return Err("SERVER_PORT must be non-zero".to_string());
        }
        if self.environment.is_production() && self.store == StoreBackend::Memory {
            return Err(
                "The memory store is per-process and cannot be used in production".to_string(),
            );
        }
        Ok(())
    }
}

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or does not parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
