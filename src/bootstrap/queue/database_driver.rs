//! Relational Queue Driver
//!
//! Table-backed driver with row-level claim semantics: `pop` selects one due
//! row with `FOR UPDATE SKIP LOCKED` so concurrent workers never fight over
//! the same job, then stamps `reserved_at` and bumps `attempts` in the same
//! transaction. The schema is created idempotently at first use.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use super::driver::{QueueDriver, ReservedJob};
use super::job::JobEnvelope;
use crate::config::{DatabaseConfig, QueueConfig};
use crate::error::{QueueError, QueueResult};

const CREATE_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id           BIGSERIAL PRIMARY KEY,
    queue        VARCHAR(255) NOT NULL,
    payload      TEXT NOT NULL,
    attempts     INT NOT NULL DEFAULT 0,
    reserved_at  TIMESTAMPTZ,
    available_at TIMESTAMPTZ NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_JOBS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS jobs_claim_idx ON jobs (queue, reserved_at, available_at)
"#;

const CREATE_FAILED_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS failed_jobs (
    id         BIGSERIAL PRIMARY KEY,
    connection VARCHAR(255) NOT NULL,
    queue      VARCHAR(255) NOT NULL,
    payload    TEXT NOT NULL,
    exception  TEXT NOT NULL,
    failed_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub struct DatabaseQueue {
    pool: Pool<Postgres>,
    stale_after: Duration,
}

impl DatabaseQueue {
    /// Connect using the environment configuration.
    pub async fn connect() -> QueueResult<Self> {
        Self::connect_url(DatabaseConfig::url()).await
    }

    /// Connect to an explicit URL. Tests use this to target a scratch
    /// database.
    pub async fn connect_url(url: &str) -> QueueResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DatabaseConfig::max_connections())
            .connect(url)
            .await?;

        sqlx::query(CREATE_JOBS_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_JOBS_INDEX).execute(&pool).await?;
        sqlx::query(CREATE_FAILED_JOBS_TABLE).execute(&pool).await?;

        Ok(Self {
            pool,
            stale_after: Duration::from_secs(QueueConfig::reservation_stale_seconds()),
        })
    }

    fn row_id(job: &ReservedJob) -> QueueResult<i64> {
        job.id
            .parse::<i64>()
            .map_err(|_| QueueError::Unavailable(format!("invalid job row id '{}'", job.id)))
    }
}

#[async_trait]
impl QueueDriver for DatabaseQueue {
    async fn push(&self, queue: &str, envelope: &JobEnvelope) -> QueueResult<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO jobs (queue, payload, attempts, reserved_at, available_at, created_at) \
             VALUES ($1, $2, 0, NULL, $3, $3)",
        )
        .bind(queue)
        .bind(envelope.encode()?)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn later(&self, queue: &str, delay: Duration, envelope: &JobEnvelope) -> QueueResult<()> {
        let now = Utc::now();
        let available_at = now + chrono::Duration::seconds(delay.as_secs() as i64);
        sqlx::query(
            "INSERT INTO jobs (queue, payload, attempts, reserved_at, available_at, created_at) \
             VALUES ($1, $2, 0, NULL, $3, $4)",
        )
        .bind(queue)
        .bind(envelope.encode()?)
        .bind(available_at)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pop(&self, queue: &str) -> QueueResult<Option<ReservedJob>> {
        let now = Utc::now();
        let stale_before = now - chrono::Duration::seconds(self.stale_after.as_secs() as i64);

        let mut tx = self.pool.begin().await?;

        // Return abandoned reservations to the pool before claiming.
        sqlx::query(
            "UPDATE jobs SET reserved_at = NULL \
             WHERE queue = $1 AND reserved_at IS NOT NULL AND reserved_at < $2",
        )
        .bind(queue)
        .bind(stale_before)
        .execute(&mut *tx)
        .await?;

        let row: Option<(i64, String, i32)> = sqlx::query_as(
            "SELECT id, payload, attempts FROM jobs \
             WHERE queue = $1 AND reserved_at IS NULL AND available_at <= $2 \
             ORDER BY id \
             FOR UPDATE SKIP LOCKED \
             LIMIT 1",
        )
        .bind(queue)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id, payload, attempts)) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let attempts = attempts + 1;
        sqlx::query("UPDATE jobs SET reserved_at = $1, attempts = $2 WHERE id = $3")
            .bind(now)
            .bind(attempts)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(ReservedJob {
            id: id.to_string(),
            payload,
            attempts: attempts as u32,
        }))
    }

    async fn delete(&self, _queue: &str, job: &ReservedJob) -> QueueResult<()> {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(Self::row_id(job)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn release(&self, _queue: &str, job: &ReservedJob, delay: Duration) -> QueueResult<()> {
        let available_at = Utc::now() + chrono::Duration::seconds(delay.as_secs() as i64);
        sqlx::query("UPDATE jobs SET reserved_at = NULL, available_at = $1 WHERE id = $2")
            .bind(available_at)
            .bind(Self::row_id(job)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bury(&self, queue: &str, job: &ReservedJob, exception: &str) -> QueueResult<()> {
        let id = Self::row_id(job)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO failed_jobs (connection, queue, payload, exception, failed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind("database")
        .bind(queue)
        .bind(&job.payload)
        .bind(exception)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn size(&self, queue: &str) -> QueueResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs \
             WHERE queue = $1 AND reserved_at IS NULL AND available_at <= $2",
        )
        .bind(queue)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}
