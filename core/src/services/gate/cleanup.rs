//! Record cleanup service for periodic maintenance of rate-limit records
//!
//! Records stop mattering once their hour bucket has ended and the phone's
//! cooldown has elapsed. Backends without native expiry are swept here.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::errors::{OtpError, OtpResult};

use super::clock::{Clock, SystemClock};
use super::traits::RateLimitStoreTrait;

/// Configuration for the record cleanup service
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Cooldown applied by the gate; records inside it are kept
    pub cooldown: Duration,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            cooldown: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Service that purges expired rate-limit records
pub struct RecordCleanupService {
    store: Arc<dyn RateLimitStoreTrait>,
    clock: Arc<dyn Clock>,
    config: CleanupConfig,
}

impl RecordCleanupService {
    /// Create a new record cleanup service
    pub fn new(store: Arc<dyn RateLimitStoreTrait>, config: CleanupConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a single cleanup cycle
    pub async fn run_cleanup(&self) -> OtpResult<CleanupResult> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let now = self.clock.now();
        let records_deleted = self
            .store
            .purge_expired(now, self.config.cooldown)
            .await
            .map_err(|message| OtpError::Store { message })?;

        info!(
            backend = self.store.backend_name(),
            records_deleted,
            event = "records_purged",
            "Rate limit cleanup completed"
        );

        Ok(CleanupResult { records_deleted })
    }

    /// Start the cleanup service as a background task
    ///
    /// This spawns a tokio task that runs cleanup at regular intervals
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled || self.config.interval_seconds == 0 {
            warn!("Rate limit cleanup service is disabled");
            return;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                "Rate limit cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_cleanup().await {
                    error!("Rate limit cleanup cycle failed: {}", e);
                }
            }
        });
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupResult {
    /// Number of expired records deleted
    pub records_deleted: usize,
}
