//! Shared-Subscription Worker Process
//!
//! A worker is a self-contained process: it rebuilds the route table from
//! the route-file registry (nothing is inherited from the supervisor), opens
//! its own broker session, and subscribes to each shared route through
//! `$share/<group>/<filter>` so the broker load-balances deliveries across
//! the worker pool.

use std::sync::Arc;

use rand::Rng;
use rumqttc::{Event, Packet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::client::{self, MqttPublisher, Publisher};
use super::handle_publish;
use crate::bootstrap::backoff::Backoff;
use crate::bootstrap::router::Router;
use crate::config::BrokerConfig;

/// Run one worker until the shutdown token fires.
pub async fn run_worker(
    index: usize,
    router: Arc<Router>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let suffix: u32 = rand::thread_rng().gen();
    let client_id = format!(
        "{}-worker-{}-{:08x}",
        BrokerConfig::client_id_prefix(),
        index,
        suffix
    );
    let group = BrokerConfig::shared_group();

    let (mqtt, mut event_loop) = client::connect(&client_id);
    let publisher: Arc<dyn Publisher> = Arc::new(MqttPublisher::new(mqtt.clone()));

    for route in router.shared_routes() {
        let filter = format!("$share/{}/{}", group, route.filter());
        mqtt.subscribe(&filter, route.qos()).await?;
        info!(worker = index, filter = %filter, qos = ?route.qos(), "subscribed");
    }

    info!(worker = index, client_id = %client_id, "worker session started");

    let mut backoff = Backoff::new();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(worker = index, "worker shutting down");
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
                    error!(worker = index, error = %e, "broker connection error");
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
    }
}
