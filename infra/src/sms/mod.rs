//! SMS Service Module
//!
//! This module provides the OTP providers the gate dispatches through.
//!
//! ## Features
//!
//! - **Hosted auth provider**: OTP delivery and verification through a hosted
//!   auth platform's HTTP API
//! - **Mock provider**: Logs codes instead of sending them, for development
//! - **Security**: Phone number masking in logs

use std::sync::Arc;

use og_core::OtpProviderTrait;
use og_shared::{Environment, ProviderConfig, ProviderKind};

use crate::InfrastructureError;

pub mod hosted_auth;
pub mod mock_sms;

pub use hosted_auth::{HostedAuthConfig, HostedAuthProvider};
pub use mock_sms::MockOtpProvider;

#[cfg(test)]
mod tests;

/// Create an OTP provider based on configuration
///
/// A misconfigured hosted provider falls back to the mock provider outside
/// production and is an error in production.
pub fn create_otp_provider(
    config: &ProviderConfig,
    environment: Environment,
) -> Result<Arc<dyn OtpProviderTrait>, InfrastructureError> {
    match config.kind {
        ProviderKind::Mock => {
            if environment.is_production() {
                return Err(InfrastructureError::Config(
                    "The mock SMS provider cannot be used in production".to_string(),
                ));
            }
            Ok(Arc::new(MockOtpProvider::new()))
        }
        ProviderKind::Hosted => match HostedAuthConfig::from_provider_config(config)
            .and_then(HostedAuthProvider::new)
        {
            Ok(provider) => Ok(Arc::new(provider)),
            Err(e) if !environment.is_production() => {
                tracing::error!("Failed to initialize hosted auth provider: {}", e);
                tracing::warn!("Falling back to mock SMS provider");
                Ok(Arc::new(MockOtpProvider::new()))
            }
            Err(e) => Err(e),
        },
    }
}
