//! Redis connection for the counter store
//!
//! One multiplexed connection shared by all clones, opened with bounded
//! exponential backoff. Read-only operations can be retried through
//! [`RedisClient::execute_with_retry`].

use redis::{aio::MultiplexedConnection, Client, RedisError, RedisResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use og_shared::config::cache::CacheConfig;

use crate::InfrastructureError;

/// Boxed future returned by operations passed to [`RedisClient::execute_with_retry`]
pub type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

const MAX_BACKOFF_MS: u64 = 5_000;

/// Attempt counter with doubling delay
#[derive(Debug, Clone, Copy)]
struct Backoff {
    attempt: u32,
    max_attempts: u32,
    delay_ms: u64,
}

impl Backoff {
    fn new(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            delay_ms: initial_delay_ms,
        }
    }

    fn start_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Sleep for the current delay, then double it
    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        self.delay_ms = (self.delay_ms * 2).min(MAX_BACKOFF_MS);
    }
}

/// Redis client shared by the counter store
///
/// Cloning is cheap: clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    config: CacheConfig,
}

impl RedisClient {
    /// Open the connection, retrying with the backoff from `config`
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            key_prefix = %config.key_prefix,
            "Connecting to Redis"
        );

        let client = Client::open(config.url.as_str())
            .map_err(|e| InfrastructureError::Config(format!("Invalid Redis URL: {}", e)))?;

        let mut backoff = Backoff::new(config.max_retries, config.retry_delay_ms);
        let connection = loop {
            let attempt = backoff.start_attempt();
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => break connection,
                Err(e) if backoff.can_retry() => {
                    warn!(attempt, delay_ms = backoff.delay_ms, error = %e, "Redis connection failed, retrying");
                    backoff.wait().await;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "Giving up on Redis connection");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        };

        info!("Connected to Redis");
        Ok(Self { connection, config })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Prefixed key
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Handle on the shared multiplexed connection
    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Run an operation, retrying connection-level failures
    ///
    /// Only for operations that can run twice without changing the outcome.
    pub async fn execute_with_retry<F, T>(&self, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut backoff = Backoff::new(self.config.max_retries, self.config.retry_delay_ms);
        loop {
            let attempt = backoff.start_attempt();
            match operation(self.connection.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if backoff.can_retry() && is_retriable_error(&e) => {
                    warn!(attempt, delay_ms = backoff.delay_ms, error = %e, "Redis operation failed, retrying");
                    backoff.wait().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// PING the server
    ///
    /// `Ok(false)` means the server answered with something other than PONG.
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let reply: String = self
            .execute_with_retry(|mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;

        debug!(reply = %reply, "Redis health check");
        Ok(reply == "PONG")
    }
}

/// Connection-level errors that may succeed on a second attempt
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Hide the credentials part of a Redis URL
pub(crate) fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
