//! Redis Queue Driver
//!
//! Three structures per queue: a pending list, a delayed sorted set keyed by
//! available-at time, and a reserved sorted set keyed by reservation time.
//! Claiming is a single Lua round trip (migrate due/stale entries, then move
//! the head of pending into reserved), so two workers can never claim the
//! same entry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use super::driver::{FailedJobRecord, QueueDriver, ReservedJob};
use super::job::JobEnvelope;
use crate::config::{QueueConfig, RedisConfig};
use crate::error::QueueResult;

mod keys {
    pub const FAILED: &str = "queues:failed";

    pub fn pending(queue: &str) -> String {
        format!("queues:{}", queue)
    }

    pub fn delayed(queue: &str) -> String {
        format!("queues:{}:delayed", queue)
    }

    pub fn reserved(queue: &str) -> String {
        format!("queues:{}:reserved", queue)
    }
}

/// Moves due delayed entries and stale reservations back onto the pending
/// list. KEYS: pending, delayed, reserved. ARGV: now, stale-before.
static MIGRATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local due = redis.call('ZRANGEBYSCORE', KEYS[2], '-inf', ARGV[1])
        for i = 1, #due do
            redis.call('ZREM', KEYS[2], due[i])
            redis.call('RPUSH', KEYS[1], due[i])
        end

        local stale = redis.call('ZRANGEBYSCORE', KEYS[3], '-inf', ARGV[2])
        for i = 1, #stale do
            redis.call('ZREM', KEYS[3], stale[i])
            redis.call('RPUSH', KEYS[1], stale[i])
        end
        "#,
    )
});

/// Atomically claims the head of the pending list into the reserved set.
/// KEYS: pending, reserved. ARGV: now.
static CLAIM_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local job = redis.call('LPOP', KEYS[1])
        if job then
            redis.call('ZADD', KEYS[2], ARGV[1], job)
        end
        return job
        "#,
    )
});

pub struct RedisQueue {
    conn: ConnectionManager,
    stale_after: Duration,
}

impl RedisQueue {
    /// Connect using the environment configuration.
    pub async fn connect() -> QueueResult<Self> {
        Self::connect_url(RedisConfig::url()).await
    }

    /// Connect to an explicit URL. Tests use this to target a scratch
    /// database.
    pub async fn connect_url(url: &str) -> QueueResult<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            stale_after: Duration::from_secs(QueueConfig::reservation_stale_seconds()),
        })
    }
}

#[async_trait]
impl QueueDriver for RedisQueue {
    async fn push(&self, queue: &str, envelope: &JobEnvelope) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(keys::pending(queue), envelope.encode()?).await?;
        Ok(())
    }

    async fn push_bulk(&self, queue: &str, envelopes: &[JobEnvelope]) -> QueueResult<()> {
        if envelopes.is_empty() {
            return Ok(());
        }
        let blobs = envelopes
            .iter()
            .map(JobEnvelope::encode)
            .collect::<QueueResult<Vec<String>>>()?;
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(keys::pending(queue), blobs).await?;
        Ok(())
    }

    async fn later(&self, queue: &str, delay: Duration, envelope: &JobEnvelope) -> QueueResult<()> {
        let available_at = Utc::now().timestamp() + delay.as_secs() as i64;
        let mut conn = self.conn.clone();
        let _: () = conn
            .zadd(keys::delayed(queue), envelope.encode()?, available_at)
            .await?;
        Ok(())
    }

    async fn pop(&self, queue: &str) -> QueueResult<Option<ReservedJob>> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        let stale_before = now - self.stale_after.as_secs() as i64;

        let _: () = MIGRATE_SCRIPT
            .key(keys::pending(queue))
            .key(keys::delayed(queue))
            .key(keys::reserved(queue))
            .arg(now)
            .arg(stale_before)
            .invoke_async(&mut conn)
            .await?;

        let raw: Option<String> = CLAIM_SCRIPT
            .key(keys::pending(queue))
            .key(keys::reserved(queue))
            .arg(now)
            .invoke_async(&mut conn)
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        // An unparseable blob still gets claimed; the worker buries it.
        let (id, attempts) = match JobEnvelope::decode(&raw) {
            Ok(envelope) => (envelope.id, envelope.attempts + 1),
            Err(_) => (String::from("unparseable"), 1),
        };

        Ok(Some(ReservedJob {
            id,
            payload: raw,
            attempts,
        }))
    }

    async fn delete(&self, queue: &str, job: &ReservedJob) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(keys::reserved(queue), &job.payload).await?;
        Ok(())
    }

    async fn release(&self, queue: &str, job: &ReservedJob, delay: Duration) -> QueueResult<()> {
        let mut envelope = JobEnvelope::decode(&job.payload)?;
        envelope.attempts = job.attempts;
        let blob = envelope.encode()?;

        let mut conn = self.conn.clone();
        let _: () = conn.zrem(keys::reserved(queue), &job.payload).await?;
        if delay.is_zero() {
            let _: () = conn.rpush(keys::pending(queue), blob).await?;
        } else {
            let available_at = Utc::now().timestamp() + delay.as_secs() as i64;
            let _: () = conn.zadd(keys::delayed(queue), blob, available_at).await?;
        }
        Ok(())
    }

    async fn bury(&self, queue: &str, job: &ReservedJob, exception: &str) -> QueueResult<()> {
        let record = FailedJobRecord {
            id: job.id.clone(),
            connection: "redis".to_string(),
            queue: queue.to_string(),
            payload: job.payload.clone(),
            exception: exception.to_string(),
            failed_at: Utc::now(),
        };

        let mut conn = self.conn.clone();
        let _: () = conn.zrem(keys::reserved(queue), &job.payload).await?;
        let _: () = conn
            .rpush(keys::FAILED, serde_json::to_string(&record)?)
            .await?;
        Ok(())
    }

    async fn size(&self, queue: &str) -> QueueResult<u64> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        let pending: u64 = conn.llen(keys::pending(queue)).await?;
        let due: u64 = conn.zcount(keys::delayed(queue), "-inf", now).await?;
        Ok(pending + due)
    }
}
