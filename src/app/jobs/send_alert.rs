use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

use crate::bootstrap::queue::job::Job;

/// Raised when a telemetry reading crosses its threshold. Runs on its own
/// queue with a longer retry budget since alert delivery matters more than
/// latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendAlert {
    pub device_id: String,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
}

impl SendAlert {
    pub const NAME: &'static str = "send_alert";
}

#[async_trait]
impl Job for SendAlert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn queue(&self) -> &str {
        "alerts"
    }

    fn max_tries(&self) -> u32 {
        5
    }

    fn retry_after(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn handle(&self) -> anyhow::Result<()> {
        warn!(
            device_id = %self.device_id,
            metric = %self.metric,
            value = self.value,
            threshold = self.threshold,
            "threshold alert"
        );
        Ok(())
    }

    async fn on_failure(&self, error: &anyhow::Error) -> anyhow::Result<()> {
        error!(
            device_id = %self.device_id,
            metric = %self.metric,
            error = %error,
            "alert could not be delivered"
        );
        Ok(())
    }
}
