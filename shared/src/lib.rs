//! Shared utilities and common types for the OTP gate server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Error codes and response envelopes
//! - Phone number utilities (normalization, region validation, masking)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CorsConfig, DatabaseConfig, Environment, LogFormat, LoggingConfig,
    ProviderConfig, ProviderKind, RateLimitConfig, ServerConfig, StoreBackend,
};
pub use errors::{error_codes, ErrorDetail};
pub use types::ApiResponse;
pub use utils::phone::{self, PhoneRegion};
