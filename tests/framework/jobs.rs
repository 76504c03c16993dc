//! Job Contract Tests
//!
//! # Coverage
//! - [x] Envelope round-trip preserves the attribute snapshot exactly
//! - [x] The registry rebuilds instances by name
//! - [x] Unknown names are decode failures (bury, no retry)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mqtt_gateway::bootstrap::queue::job::{Job, JobEnvelope, JobRegistry};
use mqtt_gateway::error::QueueError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Probe {
    device: String,
    count: u32,
    tags: Vec<String>,
}

impl Probe {
    const NAME: &'static str = "probe";
}

#[async_trait]
impl Job for Probe {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn probe() -> Probe {
    Probe {
        device: "dev-1".to_string(),
        count: 7,
        tags: vec!["a".to_string(), "b".to_string()],
    }
}

#[test]
fn envelope_snapshot_round_trips() {
    let job = probe();
    let envelope = JobEnvelope::wrap(&job).unwrap();

    assert_eq!(envelope.job, Probe::NAME);
    assert_eq!(envelope.attempts, 0);
    assert_eq!(envelope.queue, "default");
    assert!(!envelope.id.is_empty());

    let decoded = JobEnvelope::decode(&envelope.encode().unwrap()).unwrap();
    assert_eq!(decoded.id, envelope.id);
    assert_eq!(decoded.data, serde_json::to_value(&job).unwrap());

    // The snapshot rebuilds the exact pre-dispatch state.
    let rebuilt: Probe = serde_json::from_value(decoded.data).unwrap();
    assert_eq!(rebuilt, job);
}

#[tokio::test]
async fn registry_rebuilds_by_name() {
    let mut registry = JobRegistry::new();
    registry.register::<Probe>(Probe::NAME);
    assert!(registry.contains(Probe::NAME));

    let envelope = JobEnvelope::wrap(&probe()).unwrap();
    let job = registry.decode(&envelope).unwrap();

    assert_eq!(job.name(), Probe::NAME);
    assert_eq!(job.max_tries(), 3);
    job.handle().await.unwrap();
}

#[test]
fn unknown_job_name_is_a_decode_failure() {
    let registry = JobRegistry::new();

    let mut envelope = JobEnvelope::wrap(&probe()).unwrap();
    envelope.job = "vanished".to_string();

    let err = registry.decode(&envelope).unwrap_err();
    assert!(matches!(err, QueueError::UnknownJob(ref name) if name == "vanished"));
    assert!(err.is_decode());
    assert!(!err.is_transient());
}
