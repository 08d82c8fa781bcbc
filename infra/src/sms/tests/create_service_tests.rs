//! Tests for provider selection

use og_shared::{Environment, ProviderConfig, ProviderKind};

use crate::sms::create_otp_provider;
use crate::InfrastructureError;

fn hosted(base_url: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Hosted,
        base_url: base_url.map(str::to_string),
        api_key: Some("service-key".to_string()),
        timeout_secs: 5,
    }
}

#[test]
fn test_mock_provider_in_development() {
    let provider = create_otp_provider(&ProviderConfig::default(), Environment::Development).unwrap();
    assert_eq!(provider.provider_name(), "mock");
}

#[test]
fn test_mock_provider_refused_in_production() {
    let result = create_otp_provider(&ProviderConfig::default(), Environment::Production);
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[test]
fn test_hosted_provider_selected() {
    let provider =
        create_otp_provider(&hosted(Some("https://auth.example.com/")), Environment::Production)
            .unwrap();
    assert_eq!(provider.provider_name(), "hosted");
}

#[test]
fn test_misconfigured_hosted_falls_back_outside_production() {
    let provider = create_otp_provider(&hosted(None), Environment::Staging).unwrap();
    assert_eq!(provider.provider_name(), "mock");

    let result = create_otp_provider(&hosted(Some("ftp://auth")), Environment::Production);
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[test]
fn test_missing_hosted_settings_are_config_errors_in_production() {
    let Err(err) = create_otp_provider(&hosted(None), Environment::Production) else {
        panic!("hosted provider without a URL must be refused in production");
    };
    assert!(matches!(err, InfrastructureError::Config(_)));
    assert!(err.to_string().contains("AUTH_PROVIDER_URL"));

    let mut config = hosted(Some("https://auth.example.com/"));
    config.api_key = None;
    let Err(err) = create_otp_provider(&config, Environment::Production) else {
        panic!("hosted provider without an API key must be refused in production");
    };
    assert!(err.to_string().contains("AUTH_PROVIDER_API_KEY"));
}
