use once_cell::sync::Lazy;

pub struct RedisConfig {
    pub url: String,
}

pub static REDIS: Lazy<RedisConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    // REDIS_URL wins; otherwise the URL is assembled from components.
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| {
        let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
        let db = std::env::var("REDIS_DB").unwrap_or_else(|_| "0".to_string());
        let password = std::env::var("REDIS_PASSWORD").unwrap_or_default();

        if password.is_empty() {
            format!("redis://{}:{}/{}", host, port, db)
        } else {
            let user = std::env::var("REDIS_USER").unwrap_or_else(|_| "default".to_string());
            format!("redis://{}:{}@{}:{}/{}", user, password, host, port, db)
        }
    });

    RedisConfig { url }
});

impl RedisConfig {
    pub fn url() -> &'static str {
        &REDIS.url
    }
}
