use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bootstrap::queue::job::Job;

/// Records that a device reported in. Dispatched by the status handler so
/// the broker session never blocks on bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHeartbeat {
    pub device_id: String,
    /// Unix timestamp of the report, as seen by the session.
    pub reported_at: i64,
}

impl RecordHeartbeat {
    pub const NAME: &'static str = "record_heartbeat";
}

#[async_trait]
impl Job for RecordHeartbeat {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self) -> anyhow::Result<()> {
        if self.device_id.is_empty() {
            anyhow::bail!("heartbeat without a device id");
        }
        info!(
            device_id = %self.device_id,
            reported_at = self.reported_at,
            "heartbeat recorded"
        );
        Ok(())
    }
}
