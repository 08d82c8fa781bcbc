//! SMS/auth provider configuration module

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::env_or;
use super::environment::Environment;

/// Which provider delivers and verifies OTPs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted auth platform reached over HTTP
    Hosted,
    /// In-process mock that logs codes instead of sending them
    #[default]
    Mock,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hosted" | "auth" => Ok(ProviderKind::Hosted),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(format!("Invalid SMS provider: {}", s)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Hosted => write!(f, "hosted"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

/// Provider configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider selection
    #[serde(default)]
    pub kind: ProviderKind,

    /// Base URL of the hosted auth platform
    #[serde(default)]
    pub base_url: Option<String>,

    /// Service API key for the hosted auth platform
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound for one provider call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            kind: env_or("SMS_PROVIDER", ProviderKind::default()),
            base_url: std::env::var("AUTH_PROVIDER_URL").ok().filter(|v| !v.is_empty()),
            api_key: std::env::var("AUTH_PROVIDER_API_KEY").ok().filter(|v| !v.is_empty()),
            timeout_secs: env_or("SMS_PROVIDER_TIMEOUT_SECS", default_timeout_secs()),
        }
    }

    /// Provider call timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the selected provider can actually be built
    pub fn validate(&self, environment: Environment) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("SMS_PROVIDER_TIMEOUT_SECS must be at least 1".to_string());
        }
        match self.kind {
            ProviderKind::Hosted => {
                if self.base_url.is_none() {
                    return Err("AUTH_PROVIDER_URL is required for the hosted provider".to_string());
                }
                if self.api_key.is_none() {
                    return Err(
                        "AUTH_PROVIDER_API_KEY is required for the hosted provider".to_string()
                    );
                }
                Ok(())
            }
            ProviderKind::Mock if environment.is_production() => {
                Err("The mock SMS provider cannot be used in production".to_string())
            }
            ProviderKind::Mock => Ok(()),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig {
            kind: ProviderKind::Hosted,
            base_url: Some("https://auth.example.com".to_string()),
            api_key: Some("super-secret".to_string()),
            timeout_secs: 5,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_hosted_requires_credentials() {
        let config = ProviderConfig {
            kind: ProviderKind::Hosted,
            ..Default::default()
        };
        assert!(config.validate(Environment::Development).is_err());
    }

    #[test]
    fn test_mock_rejected_in_production() {
        let config = ProviderConfig::default();
        assert!(config.validate(Environment::Development).is_ok());
        assert!(config.validate(Environment::Production).is_err());
    }
}
