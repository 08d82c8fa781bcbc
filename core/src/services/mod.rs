//! Business services containing domain logic and use cases.

pub mod gate;

// Re-export commonly used types
pub use gate::{
    CleanupConfig, CleanupResult, Clock, GateConfig, ManualClock, OtpGate,
    OtpProviderTrait, ProviderVerification, RateLimitStoreTrait, RecordCleanupService,
    SendOtpReceipt, SystemClock, VerifyOtpOutcome,
};
