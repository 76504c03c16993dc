//! MQTT Sessions
//!
//! The main session serves every non-shared route over a single broker
//! connection. Shared routes are left to the worker processes managed by the
//! supervisor, which subscribe through the broker's shared-subscription
//! convention so messages are load-balanced across the pool.

pub mod client;
pub mod supervisor;
pub mod worker;

use std::sync::Arc;

use rumqttc::{Event, Packet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use self::client::{MqttPublisher, Publisher};
use crate::bootstrap::backoff::Backoff;
use crate::bootstrap::router::{Payload, Router};
use crate::config::BrokerConfig;
use crate::error::DispatchError;

/// Recover the logical topic from a shared-subscription delivery by
/// stripping the `$share/<group>/` prefix.
pub fn strip_shared_prefix(topic: &str) -> &str {
    if let Some(rest) = topic.strip_prefix("$share/") {
        if let Some(slash) = rest.find('/') {
            return &rest[slash + 1..];
        }
    }
    topic
}

/// Decode a delivery and run it through the route table. Dispatch failures
/// never tear down the calling session.
pub async fn handle_publish(
    router: &Router,
    publisher: &Arc<dyn Publisher>,
    raw_topic: &str,
    body: &[u8],
) {
    let topic = strip_shared_prefix(raw_topic);
    let payload = Payload::decode(body);

    match router.dispatch(topic, payload, publisher.clone()).await {
        Ok(value) => debug!(topic, result = %value, "message handled"),
        Err(DispatchError::NoRoute(_)) => {
            warn!(topic, "no route matched, dropping message");
        }
        Err(e) => {
            error!(topic, error = %e, "message dispatch failed");
        }
    }
}

/// Run the main session until the shutdown token fires.
///
/// Subscribes every non-shared route at its declared QoS, then dispatches
/// deliveries as they arrive. Connection errors back off exponentially; the
/// client library handles reconnection itself.
pub async fn run_main_session(
    router: Arc<Router>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let client_id = format!("{}-main-{}", BrokerConfig::client_id_prefix(), Uuid::new_v4());
    let (mqtt, mut event_loop) = client::connect(&client_id);
    let publisher: Arc<dyn Publisher> = Arc::new(MqttPublisher::new(mqtt.clone()));

    for route in router.standard_routes() {
        mqtt.subscribe(route.filter(), route.qos()).await?;
        info!(filter = route.filter(), qos = ?route.qos(), "subscribed");
    }

    info!(client_id = %client_id, "main session started");

    let mut backoff = Backoff::new();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("main session shutting down");
                mqtt.disconnect().await.ok();
                return Ok(());
            }
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    backoff.reset();
                    handle_publish(&router, &publisher, &publish.topic, &publish.payload).await;
                }
                Ok(_) => {
                    backoff.reset();
                }
                Err(e) => {
                    error!(error = %e, "broker connection error");
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
    }
}
