use once_cell::sync::Lazy;

pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

pub static DATABASE: Lazy<DatabaseConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    // DATABASE_URL wins; otherwise the URL is assembled from components.
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        let host = std::env::var("DB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let name = std::env::var("DB_NAME").unwrap_or_else(|_| "mqtt_gateway".to_string());
        let user = std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
        let password = std::env::var("DB_PASSWORD").unwrap_or_default();

        format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
    });

    DatabaseConfig {
        url,
        max_connections: std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid number"),
    }
});

impl DatabaseConfig {
    pub fn url() -> &'static str {
        &DATABASE.url
    }

    pub fn max_connections() -> u32 {
        DATABASE.max_connections
    }
}
