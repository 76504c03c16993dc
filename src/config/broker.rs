use once_cell::sync::Lazy;

pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id_prefix: String,
    pub username: String,
    pub password: String,
    pub shared_group: String,
    pub keep_alive_seconds: u64,
}

pub static BROKER: Lazy<BrokerConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    BrokerConfig {
        host: std::env::var("MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: std::env::var("MQTT_PORT")
            .unwrap_or_else(|_| "1883".to_string())
            .parse()
            .expect("MQTT_PORT must be a valid number"),
        client_id_prefix: std::env::var("MQTT_CLIENT_ID_PREFIX")
            .unwrap_or_else(|_| "mqtt_gateway".to_string()),
        username: std::env::var("MQTT_USERNAME").unwrap_or_default(),
        password: std::env::var("MQTT_PASSWORD").unwrap_or_default(),
        shared_group: std::env::var("MQTT_SHARED_GROUP").unwrap_or_else(|_| "workers".to_string()),
        keep_alive_seconds: std::env::var("MQTT_KEEP_ALIVE_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .expect("MQTT_KEEP_ALIVE_SECONDS must be a valid number"),
    }
});

impl BrokerConfig {
    pub fn host() -> &'static str {
        &BROKER.host
    }

    pub fn port() -> u16 {
        BROKER.port
    }

    pub fn client_id_prefix() -> &'static str {
        &BROKER.client_id_prefix
    }

    /// Empty when the broker does not require authentication.
    pub fn username() -> &'static str {
        &BROKER.username
    }

    pub fn password() -> &'static str {
        &BROKER.password
    }

    /// Shared-subscription group name used by worker processes.
    pub fn shared_group() -> &'static str {
        &BROKER.shared_group
    }

    pub fn keep_alive_seconds() -> u64 {
        BROKER.keep_alive_seconds
    }
}
