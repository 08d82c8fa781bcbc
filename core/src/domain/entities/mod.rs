//! Domain entities representing core business objects.

pub mod rate_limit_record;

// Re-export commonly used types
pub use rate_limit_record::{ceil_seconds, HourBucket, RateLimitRecord};
