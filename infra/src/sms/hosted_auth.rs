//! Hosted auth platform provider
//!
//! Delivers and verifies phone OTPs through a hosted auth platform's REST API:
//! - `POST {base_url}/auth/v1/otp` with `{"phone": ...}`
//! - `POST {base_url}/auth/v1/verify` with `{"type": "sms", "phone": ..., "token": ...}`
//!
//! Requests carry the service key both as `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use og_core::{OtpProviderTrait, ProviderVerification};
use og_shared::phone::mask_phone_number;
use og_shared::ProviderConfig;

use crate::InfrastructureError;

/// Hosted auth provider configuration
#[derive(Clone)]
pub struct HostedAuthConfig {
    /// Base URL, e.g. `https://project.auth.example.com`
    pub base_url: String,
    /// Service API key
    pub api_key: String,
    /// Timeout for API requests
    pub request_timeout: Duration,
}

impl std::fmt::Debug for HostedAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAuthConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl HostedAuthConfig {
    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self, InfrastructureError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| InfrastructureError::Config("AUTH_PROVIDER_URL not set".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| InfrastructureError::Config("AUTH_PROVIDER_API_KEY not set".to_string()))?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InfrastructureError::Config(
                "AUTH_PROVIDER_URL must be an http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: config.timeout(),
        })
    }
}

/// OTP provider backed by a hosted auth platform
pub struct HostedAuthProvider {
    client: Client,
    config: HostedAuthConfig,
}

impl HostedAuthProvider {
    pub fn new(config: HostedAuthConfig) -> Result<Self, InfrastructureError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        info!(base_url = %config.base_url, "Hosted auth provider initialized");

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value), InfrastructureError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, body))
    }
}

/// Error message from a provider response body, falling back to the status line
pub(crate) fn error_message(status: StatusCode, body: &Value) -> String {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl OtpProviderTrait for HostedAuthProvider {
    async fn send_otp(&self, phone: &str) -> Result<(), String> {
        let masked = mask_phone_number(phone);
        debug!(phone = %masked, "Requesting OTP from hosted auth provider");

        let (status, body) = self
            .post("otp", json!({ "phone": phone }))
            .await
            .map_err(|e| {
                error!(phone = %masked, error = %e, "Hosted auth OTP request failed");
                e.to_string()
            })?;

        if status.is_success() {
            info!(phone = %masked, "Hosted auth provider accepted OTP request");
            Ok(())
        } else {
            let message = error_message(status, &body);
            warn!(phone = %masked, status = status.as_u16(), error = %message, "Hosted auth provider refused OTP request");
            Err(message)
        }
    }

    async fn verify_otp(&self, phone: &str, token: &str) -> Result<ProviderVerification, String> {
        let masked = mask_phone_number(phone);

        let (status, body) = self
            .post("verify", json!({ "type": "sms", "phone": phone, "token": token }))
            .await
            .map_err(|e| {
                error!(phone = %masked, error = %e, "Hosted auth verify request failed");
                e.to_string()
            })?;

        if status.is_success() {
            Ok(ProviderVerification::Verified { session: body })
        } else if status.is_client_error() {
            Ok(ProviderVerification::Rejected {
                message: error_message(status, &body),
            })
        } else {
            let message = error_message(status, &body);
            warn!(phone = %masked, status = status.as_u16(), error = %message, "Hosted auth verify failed");
            Err(message)
        }
    }

    fn provider_name(&self) -> &str {
        "hosted"
    }
}
