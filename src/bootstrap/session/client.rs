//! Broker client plumbing
//!
//! Wraps the MQTT client behind a `Publisher` seam so handlers and tests
//! do not depend on a live connection.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tracing::debug;

use crate::config::BrokerConfig;

const MESSAGE_CHANNEL_CAPACITY: usize = 1000;

/// Handle for publishing messages back to the broker.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> anyhow::Result<()>;
}

/// Publisher backed by a live broker connection.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> anyhow::Result<()> {
        self.client.publish(topic, qos, retain, payload).await?;
        debug!(topic, "published message");
        Ok(())
    }
}

/// Publisher that discards everything. Useful for dispatching outside a
/// broker session.
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(
        &self,
        _topic: &str,
        _payload: Vec<u8>,
        _qos: QoS,
        _retain: bool,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Open a broker connection with the configured credentials.
pub fn connect(client_id: &str) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(client_id, BrokerConfig::host(), BrokerConfig::port());
    options.set_keep_alive(Duration::from_secs(BrokerConfig::keep_alive_seconds()));

    if !BrokerConfig::username().is_empty() {
        options.set_credentials(BrokerConfig::username(), BrokerConfig::password());
    }

    AsyncClient::new(options, MESSAGE_CHANNEL_CAPACITY)
}
