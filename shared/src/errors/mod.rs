//! Shared error codes and the error body carried by API responses

use serde::{Deserialize, Serialize};

/// Machine-readable error codes returned to clients
pub mod error_codes {
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const VERIFICATION_FAILED: &str = "VERIFICATION_FAILED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Error body of a failed API response
///
/// Rejections carry the numeric parameter the client needs to render a
/// precise message ("try again in N seconds", "max N per hour").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code from [`error_codes`]
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Seconds until the request may be retried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    /// The limit that was hit (hourly cap)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ErrorDetail {
    /// Create a new error detail
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retry_after: None,
            limit: None,
        }
    }

    /// Attach a retry hint in seconds
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Attach the limit that was exceeded
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
