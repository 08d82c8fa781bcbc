//! MySQL counter store
//!
//! `otp_phone_state` holds one row per phone with its latest accepted
//! request; `otp_rate_limits` holds the count per (phone, hour bucket).
//! A conditional commit locks the phone's state row with `SELECT ... FOR UPDATE`
//! so concurrent commits for one phone serialize while other phones proceed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, error, info};

use og_core::{CommitOutcome, HourBucket, RateLimitRecord, RateLimitStoreTrait, UpsertCondition};
use og_shared::phone::mask_phone_number;
use og_shared::DatabaseConfig;

use crate::InfrastructureError;

/// MySQL implementation of the counter store
pub struct MySqlRateLimitStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRateLimitStore {
    /// Create a store over an existing pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        info!(max_connections = config.max_connections, "Connecting to MySQL counter store");

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout)))
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to MySQL");
                InfrastructureError::Database(e)
            })?;

        Ok(Self::new(pool))
    }

    /// Apply the schema migrations shipped in `infra/migrations`
    pub async fn migrate(&self) -> Result<(), InfrastructureError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn read(
        &self,
        phone: &str,
        bucket: HourBucket,
    ) -> Result<Option<RateLimitRecord>, InfrastructureError> {
        let query = r#"
            SELECT s.last_request_at, r.request_count
            FROM otp_phone_state s
            LEFT JOIN otp_rate_limits r
                ON r.phone = s.phone AND r.hour_bucket = ?
            WHERE s.phone = ?
        "#;

        let row = sqlx::query(query)
            .bind(bucket.to_string())
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(last_request_at) = row.try_get::<Option<DateTime<Utc>>, _>("last_request_at")? else {
            return Ok(None);
        };
        let request_count: Option<u32> = row.try_get("request_count")?;

        Ok(Some(RateLimitRecord {
            phone: phone.to_string(),
            hour_bucket: bucket,
            request_count: request_count.unwrap_or(0),
            last_request_at,
        }))
    }

    async fn commit(&self, condition: &UpsertCondition) -> Result<CommitOutcome, InfrastructureError> {
        let bucket = condition.hour_bucket.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT IGNORE INTO otp_phone_state (phone, last_request_at) VALUES (?, NULL)")
            .bind(&condition.phone)
            .execute(&mut *tx)
            .await?;

        let last_request_at: Option<DateTime<Utc>> = sqlx::query(
            "SELECT last_request_at FROM otp_phone_state WHERE phone = ? FOR UPDATE",
        )
        .bind(&condition.phone)
        .fetch_one(&mut *tx)
        .await?
        .try_get("last_request_at")?;

        let count: u32 = sqlx::query(
            "SELECT request_count FROM otp_rate_limits WHERE phone = ? AND hour_bucket = ?",
        )
        .bind(&condition.phone)
        .bind(&bucket)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.try_get::<u32, _>("request_count"))
        .transpose()?
        .unwrap_or(0);

        if let Some(rejection) = condition.rejection(last_request_at, count) {
            tx.rollback().await?;
            debug!(
                phone = %mask_phone_number(&condition.phone),
                hour_bucket = %bucket,
                "Conditional commit rejected"
            );
            return Ok(rejection);
        }

        sqlx::query(
            r#"
            INSERT INTO otp_rate_limits (phone, hour_bucket, request_count, last_request_at)
            VALUES (?, ?, 1, ?)
            ON DUPLICATE KEY UPDATE
                request_count = request_count + 1,
                last_request_at = VALUES(last_request_at)
            "#,
        )
        .bind(&condition.phone)
        .bind(&bucket)
        .bind(condition.now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE otp_phone_state SET last_request_at = ? WHERE phone = ?")
            .bind(condition.now)
            .bind(&condition.phone)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CommitOutcome::Committed(condition.committed_record(count)))
    }

    async fn purge(&self, now: DateTime<Utc>, cooldown: Duration) -> Result<usize, InfrastructureError> {
        let current_bucket = HourBucket::containing(now).to_string();
        let cooldown = chrono::Duration::from_std(cooldown)
            .map_err(|e| InfrastructureError::Config(e.to_string()))?;

        // Bucket strings sort chronologically
        let deleted = sqlx::query("DELETE FROM otp_rate_limits WHERE hour_bucket < ?")
            .bind(&current_bucket)
            .execute(&self.pool)
            .await?
            .rows_affected();

        sqlx::query(
            r#"
            DELETE FROM otp_phone_state
            WHERE (last_request_at IS NULL OR last_request_at < ?)
              AND phone NOT IN (SELECT phone FROM otp_rate_limits)
            "#,
        )
        .bind(now - cooldown)
        .execute(&self.pool)
        .await?;

        Ok(deleted as usize)
    }
}

#[async_trait]
impl RateLimitStoreTrait for MySqlRateLimitStore {
    async fn get(&self, phone: &str, bucket: HourBucket) -> Result<Option<RateLimitRecord>, String> {
        self.read(phone, bucket).await.map_err(|e| e.to_string())
    }

    async fn conditional_upsert(&self, condition: &UpsertCondition) -> Result<CommitOutcome, String> {
        self.commit(condition).await.map_err(|e| e.to_string())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, cooldown: Duration) -> Result<usize, String> {
        self.purge(now, cooldown).await.map_err(|e| e.to_string())
    }

    async fn health_check(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| InfrastructureError::Database(e).to_string())
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}
