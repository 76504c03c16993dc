//! Telemetry ingest handler
//!
//! Served by the shared-subscription worker pool so bursts of readings are
//! load-balanced across processes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::app::jobs::SendAlert;
use crate::bootstrap::queue::QueueManager;
use crate::bootstrap::router::{Handler, MessageContext};

#[derive(Debug, Deserialize)]
struct MetricReading {
    value: f64,
}

pub struct IngestMetric {
    queue: Arc<QueueManager>,
    alert_threshold: f64,
}

impl IngestMetric {
    pub fn new(queue: Arc<QueueManager>, alert_threshold: f64) -> Self {
        Self {
            queue,
            alert_threshold,
        }
    }
}

#[async_trait]
impl Handler for IngestMetric {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value> {
        let device_id = ctx
            .param("device_id")
            .ok_or_else(|| anyhow::anyhow!("missing device_id capture"))?
            .to_string();
        let metric = ctx
            .param("metric")
            .ok_or_else(|| anyhow::anyhow!("missing metric capture"))?
            .to_string();

        let reading: MetricReading = ctx.payload.parse()?;
        debug!(
            device_id = %device_id,
            metric = %metric,
            value = reading.value,
            "telemetry reading"
        );

        let mut alerted = false;
        if reading.value >= self.alert_threshold {
            self.queue
                .dispatch(&SendAlert {
                    device_id: device_id.clone(),
                    metric: metric.clone(),
                    value: reading.value,
                    threshold: self.alert_threshold,
                })
                .await?;
            alerted = true;
        }

        Ok(json!({
            "device_id": device_id,
            "metric": metric,
            "accepted": true,
            "alerted": alerted,
        }))
    }
}
