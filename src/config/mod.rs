//! Configuration Module
//!
//! Environment-backed configuration, loaded lazily from `.env` / process
//! environment. Each config struct is a `once_cell` singleton with static
//! accessors.

pub mod app;
pub mod broker;
pub mod database;
pub mod queue;
pub mod redis;

pub use app::AppConfig;
pub use broker::BrokerConfig;
pub use database::DatabaseConfig;
pub use queue::QueueConfig;
pub use redis::RedisConfig;
