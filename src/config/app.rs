use once_cell::sync::Lazy;

pub struct AppConfig {
    pub rust_log: String,
    /// Grace period the supervisor grants workers between SIGTERM and kill.
    pub worker_grace_seconds: u64,
}

pub static APP: Lazy<AppConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    AppConfig {
        rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        worker_grace_seconds: std::env::var("WORKER_GRACE_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .expect("WORKER_GRACE_SECONDS must be a valid number"),
    }
});

impl AppConfig {
    pub fn rust_log() -> &'static str {
        &APP.rust_log
    }

    pub fn worker_grace_seconds() -> u64 {
        APP.worker_grace_seconds
    }
}
