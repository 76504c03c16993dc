use once_cell::sync::Lazy;

/// Default job timeout used to derive the stale-reservation threshold.
const DEFAULT_JOB_TIMEOUT_SECONDS: u64 = 60;

pub struct QueueConfig {
    /// Selected driver: "redis" (list + sorted set) or "database" (relational).
    pub connection: String,
    /// Seconds a worker sleeps when `pop` comes back empty.
    pub sleep_seconds: u64,
    /// Reservations older than this are returned to the pending queue.
    pub reservation_stale_seconds: u64,
}

pub static QUEUE: Lazy<QueueConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    // reservation_stale_after = max(90s, 2 x default job timeout), unless
    // pinned explicitly in the environment.
    let stale_default = std::cmp::max(90, 2 * DEFAULT_JOB_TIMEOUT_SECONDS);

    QueueConfig {
        connection: std::env::var("QUEUE_CONNECTION").unwrap_or_else(|_| "redis".to_string()),
        sleep_seconds: std::env::var("QUEUE_SLEEP_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .expect("QUEUE_SLEEP_SECONDS must be a valid number"),
        reservation_stale_seconds: std::env::var("QUEUE_RESERVATION_STALE_SECONDS")
            .unwrap_or_else(|_| stale_default.to_string())
            .parse()
            .expect("QUEUE_RESERVATION_STALE_SECONDS must be a valid number"),
    }
});

impl QueueConfig {
    pub fn connection() -> &'static str {
        &QUEUE.connection
    }

    pub fn sleep_seconds() -> u64 {
        QUEUE.sleep_seconds
    }

    pub fn reservation_stale_seconds() -> u64 {
        QUEUE.reservation_stale_seconds
    }
}
