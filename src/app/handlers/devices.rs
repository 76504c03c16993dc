//! Device handlers
//!
//! Terminal handlers for the device status and config routes. Anything
//! heavier than an ack belongs in a queue job so the session's event loop
//! stays responsive.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::jobs::RecordHeartbeat;
use crate::bootstrap::queue::QueueManager;
use crate::bootstrap::router::{Handler, MessageContext, QoS};

#[derive(Debug, Deserialize)]
struct StatusReport {
    #[serde(default)]
    online: bool,
    #[serde(default)]
    battery: Option<f64>,
}

/// Acks a device status report and defers the bookkeeping to the queue.
pub struct RecordStatus {
    queue: Arc<QueueManager>,
}

impl RecordStatus {
    pub fn new(queue: Arc<QueueManager>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Handler for RecordStatus {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value> {
        let device_id = ctx
            .param("device_id")
            .ok_or_else(|| anyhow::anyhow!("missing device_id capture"))?
            .to_string();

        let report: StatusReport = ctx.payload.parse()?;
        info!(
            device_id = %device_id,
            online = report.online,
            battery = report.battery,
            "device status received"
        );

        let job_id = self
            .queue
            .dispatch(&RecordHeartbeat {
                device_id: device_id.clone(),
                reported_at: Utc::now().timestamp(),
            })
            .await?;

        let ack_topic = format!("devices/{}/status/ack", device_id);
        ctx.publisher
            .publish(
                &ack_topic,
                serde_json::to_vec(&json!({ "ok": true }))?,
                QoS::AtMostOnce,
                false,
            )
            .await?;

        Ok(json!({ "device_id": device_id, "job_id": job_id }))
    }
}

/// Replies to a config request with the current device defaults.
pub struct ConfigRequest;

#[async_trait]
impl Handler for ConfigRequest {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value> {
        let device_id = ctx
            .param("device_id")
            .ok_or_else(|| anyhow::anyhow!("missing device_id capture"))?
            .to_string();

        let config = json!({
            "device_id": device_id,
            "report_interval_seconds": 60,
            "telemetry_enabled": true,
        });

        let config_topic = format!("devices/{}/config", device_id);
        ctx.publisher
            .publish(
                &config_topic,
                serde_json::to_vec(&config)?,
                QoS::AtLeastOnce,
                false,
            )
            .await?;

        Ok(config)
    }
}
