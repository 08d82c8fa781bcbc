//! OTP request gate
//!
//! This module guards an external SMS/auth provider with:
//! - Phone number validation against the configured region
//! - A per-phone cooldown between accepted requests
//! - A per-phone cap on accepted requests per UTC hour
//! - An atomic conditional commit so concurrent requests cannot overshoot
//! - OTP verification forwarded to the same provider
//! - Periodic purge of expired rate-limit records

mod cleanup;
mod clock;
mod config;
mod service;
mod traits;
mod types;


pub use cleanup::{CleanupConfig, CleanupResult, RecordCleanupService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GateConfig;
pub use service::OtpGate;
pub use traits::{OtpProviderTrait, ProviderVerification, RateLimitStoreTrait};
pub use types::{SendOtpReceipt, VerifyOtpOutcome};
