//! Mock OTP provider for development
//!
//! Generates codes locally and writes them to the log instead of sending an SMS.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{info, warn};

use og_core::{OtpProviderTrait, ProviderVerification};
use og_shared::phone::mask_phone_number;

/// Length of generated codes
pub const CODE_LENGTH: usize = 6;

/// In-process OTP provider
#[derive(Debug, Default)]
pub struct MockOtpProvider {
    /// Outstanding code per phone
    codes: DashMap<String, String>,
    sent: AtomicUsize,
    simulate_failure: AtomicBool,
}

impl MockOtpProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, as an unreachable provider would
    pub fn set_simulate_failure(&self, fail: bool) {
        self.simulate_failure.store(fail, Ordering::SeqCst);
    }

    /// Number of OTPs dispatched
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    /// Outstanding code for a phone
    pub fn code_for(&self, phone: &str) -> Option<String> {
        self.codes.get(phone).map(|code| code.clone())
    }

    fn generate_code() -> String {
        let value: u32 = rand::thread_rng().gen_range(0..10u32.pow(CODE_LENGTH as u32));
        format!("{:0width$}", value, width = CODE_LENGTH)
    }
}

#[async_trait]
impl OtpProviderTrait for MockOtpProvider {
    async fn send_otp(&self, phone: &str) -> Result<(), String> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err("Mock SMS provider failure".to_string());
        }

        let code = Self::generate_code();
        info!(
            phone = %mask_phone_number(phone),
            code = %code,
            "[MOCK SMS] OTP generated"
        );
        self.codes.insert(phone.to_string(), code);
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, token: &str) -> Result<ProviderVerification, String> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err("Mock SMS provider failure".to_string());
        }

        match self.codes.remove_if(phone, |_, code| code == token) {
            Some(_) => Ok(ProviderVerification::Verified {
                session: json!({
                    "user": { "phone": phone },
                    "provider": "mock",
                }),
            }),
            None => {
                warn!(phone = %mask_phone_number(phone), "[MOCK SMS] OTP mismatch");
                Ok(ProviderVerification::Rejected {
                    message: "Invalid OTP".to_string(),
                })
            }
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
