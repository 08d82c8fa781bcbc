//! Domain-specific error types and error handling.

use og_shared::errors::error_codes;
use thiserror::Error;

/// Errors produced by the OTP gate
///
/// Rejections carry the numeric parameter the client needs to render its
/// message; the API layer maps each variant onto a status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Too many requests, retry in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Hourly limit of {cap} OTP requests reached, retry in {retry_after_seconds} seconds")]
    QuotaExceeded { cap: u32, retry_after_seconds: u64 },

    #[error("SMS provider error: {message}")]
    Provider { message: String },

    #[error("Rate limit store error: {message}")]
    Store { message: String },

    #[error("{message}")]
    VerificationFailed { message: String },
}

impl OtpError {
    pub fn invalid_phone(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: "phone".to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_otp(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: "otp".to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidInput { .. } => error_codes::INVALID_INPUT,
            OtpError::RateLimited { .. } => error_codes::RATE_LIMITED,
            OtpError::QuotaExceeded { .. } => error_codes::QUOTA_EXCEEDED,
            OtpError::Provider { .. } => error_codes::PROVIDER_ERROR,
            OtpError::Store { .. } => error_codes::STORE_ERROR,
            OtpError::VerificationFailed { .. } => error_codes::VERIFICATION_FAILED,
        }
    }

    /// Seconds until a rejected request may be retried
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            OtpError::RateLimited {
                retry_after_seconds,
            }
            | OtpError::QuotaExceeded {
                retry_after_seconds,
                ..
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    /// The hourly cap, for quota rejections
    pub fn limit(&self) -> Option<u32> {
        match self {
            OtpError::QuotaExceeded { cap, .. } => Some(*cap),
            _ => None,
        }
    }

    /// Whether this is a rate-limit rejection (cooldown or quota)
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            OtpError::RateLimited { .. } | OtpError::QuotaExceeded { .. }
        )
    }
}

pub type OtpResult<T> = Result<T, OtpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_accessors() {
        let err = OtpError::RateLimited {
            retry_after_seconds: 50,
        };
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(err.retry_after_seconds(), Some(50));
        assert_eq!(err.limit(), None);
        assert!(err.is_rate_limit());
        assert_eq!(err.to_string(), "Too many requests, retry in 50 seconds");
    }

    #[test]
    fn test_quota_exceeded_accessors() {
        let err = OtpError::QuotaExceeded {
            cap: 5,
            retry_after_seconds: 1,
        };
        assert_eq!(err.code(), "QUOTA_EXCEEDED");
        assert_eq!(err.retry_after_seconds(), Some(1));
        assert_eq!(err.limit(), Some(5));
    }

    #[test]
    fn test_non_rate_limit_errors() {
        let err = OtpError::invalid_phone("bad");
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.to_string(), "Invalid phone: bad");
        assert!(!err.is_rate_limit());

        let err = OtpError::Store {
            message: "down".to_string(),
        };
        assert_eq!(err.code(), "STORE_ERROR");
        assert_eq!(err.retry_after_seconds(), None);

        let err = OtpError::VerificationFailed {
            message: "Invalid OTP".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid OTP");
    }
}
