pub mod record_heartbeat;
pub mod send_alert;

pub use record_heartbeat::RecordHeartbeat;
pub use send_alert::SendAlert;

use crate::bootstrap::queue::JobRegistry;

/// Build the process-wide job registry. Every job the application can
/// enqueue must be registered here so workers can rebuild it by name.
pub fn registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register::<RecordHeartbeat>(RecordHeartbeat::NAME);
    registry.register::<SendAlert>(SendAlert::NAME);
    registry
}
