//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the OTP gate. It
//! provides concrete implementations of the collaborator traits defined in
//! `og_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client with connection retry and backoff
//! - **Store**: Rate-limit counter stores (Redis, in-memory, MySQL)
//! - **SMS**: OTP providers (hosted auth API, mock)
//!
//! ## Features
//!
//! - `mysql`: Enable the MySQL counter store (default)

use std::sync::Arc;

use og_core::{OtpProviderTrait, RateLimitStoreTrait};
use og_shared::{AppConfig, StoreBackend};

/// Cache module - Redis client and operations
pub mod cache;

/// SMS module - OTP providers
pub mod sms;

/// Store module - rate-limit counter stores
pub mod store;

use cache::redis_client::RedisClient;
use store::{InMemoryRateLimitStore, RedisRateLimitStore};

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Counter store selected by configuration
    pub store: Arc<dyn RateLimitStoreTrait>,
    /// OTP provider selected by configuration
    pub provider: Arc<dyn OtpProviderTrait>,
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - The counter store (Redis connection, MySQL pool with migrations, or in-memory map)
/// - The SMS/auth provider client
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!(
        store = %config.store,
        provider = %config.provider.kind,
        "Initializing infrastructure services..."
    );

    let store = create_store(config).await?;
    let provider = sms::create_otp_provider(&config.provider, config.environment)?;

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices { store, provider })
}

/// Create the counter store selected by `config.store`
pub async fn create_store(
    config: &AppConfig,
) -> Result<Arc<dyn RateLimitStoreTrait>, InfrastructureError> {
    match config.store {
        StoreBackend::Redis => {
            let client = RedisClient::new(config.cache.clone()).await?;
            Ok(Arc::new(RedisRateLimitStore::new(Arc::new(client))))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory counter store; limits are not shared between instances");
            Ok(Arc::new(InMemoryRateLimitStore::new()))
        }
        #[cfg(feature = "mysql")]
        StoreBackend::Mysql => {
            let store = store::MySqlRateLimitStore::connect(&config.database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mysql"))]
        StoreBackend::Mysql => Err(InfrastructureError::Config(
            "The mysql store requires the `mysql` feature".to_string(),
        )),
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[cfg(feature = "mysql")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored data could not be interpreted
    #[error("Corrupt store data: {0}")]
    Corrupt(String),
}
