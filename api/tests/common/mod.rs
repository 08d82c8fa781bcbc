//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use og_api::AppState;
use og_core::{
    CommitOutcome, GateConfig, HourBucket, ManualClock, OtpGate, OtpProviderTrait,
    ProviderVerification, RateLimitRecord, RateLimitStoreTrait, UpsertCondition,
};
use og_infra::store::InMemoryRateLimitStore;
use og_shared::AppConfig;

pub const PHONE: &str = "+919876543210";
pub const VALID_CODE: &str = "123456";

/// Provider that accepts one fixed code and can be told to fail sends
pub struct ScriptedProvider {
    pub fail_sends: AtomicBool,
    pub sent: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            fail_sends: AtomicBool::new(false),
            sent: AtomicUsize::new(0),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OtpProviderTrait for ScriptedProvider {
    async fn send_otp(&self, _phone: &str) -> Result<(), String> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err("SMS quota exhausted".to_string());
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, token: &str) -> Result<ProviderVerification, String> {
        if token == VALID_CODE {
            Ok(ProviderVerification::Verified {
                session: serde_json::json!({
                    "access_token": "session-token",
                    "user": { "phone": phone }
                }),
            })
        } else {
            Ok(ProviderVerification::Rejected {
                message: "Token has expired or is invalid".to_string(),
            })
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Store whose backend is unreachable
pub struct UnavailableStore;

#[async_trait]
impl RateLimitStoreTrait for UnavailableStore {
    async fn get(&self, _phone: &str, _bucket: HourBucket) -> Result<Option<RateLimitRecord>, String> {
        Err("connection refused".to_string())
    }

    async fn conditional_upsert(&self, _condition: &UpsertCondition) -> Result<CommitOutcome, String> {
        Err("connection refused".to_string())
    }

    async fn health_check(&self) -> Result<(), String> {
        Err("connection refused".to_string())
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub provider: Arc<ScriptedProvider>,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(chrono::Duration::seconds(seconds));
    }
}

pub fn gate_config(cooldown_seconds: u64, hourly_cap: u32) -> GateConfig {
    GateConfig {
        cooldown: Duration::from_secs(cooldown_seconds),
        hourly_cap,
        ..Default::default()
    }
}

/// A clock parked early in the current hour so tests that move time
/// forward by a few minutes stay inside one bucket
pub fn start_of_test() -> DateTime<Utc> {
    HourBucket::containing(Utc::now()).start() + chrono::Duration::minutes(1)
}

pub fn context_with_store(
    store: Arc<dyn RateLimitStoreTrait>,
    config: GateConfig,
) -> TestContext {
    let provider = Arc::new(ScriptedProvider::new());
    let clock = Arc::new(ManualClock::new(start_of_test()));
    let gate = OtpGate::new(store, provider.clone(), config).with_clock(clock.clone());
    let state = web::Data::new(AppState::new(Arc::new(gate), AppConfig::default()));
    TestContext {
        state,
        provider,
        clock,
    }
}

pub fn context(config: GateConfig) -> TestContext {
    context_with_store(Arc::new(InMemoryRateLimitStore::new()), config)
}
