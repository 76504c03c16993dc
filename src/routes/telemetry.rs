//!
//! Telemetry Routes
//!
//! High-volume readings go through a shared subscription so the broker
//! spreads them across the worker pool.

use crate::app::handlers::telemetry::IngestMetric;
use crate::app::middleware::{DeviceAuth, RequestLog};
use crate::bootstrap::context::AppContext;
use crate::bootstrap::router::{QoS, RouteDef, Router};
use crate::error::RouteResult;

/// Readings at or above this value raise an alert job.
const ALERT_THRESHOLD: f64 = 90.0;

pub fn register(app: &AppContext, router: &mut Router) -> RouteResult<()> {
    let mut telemetry = router
        .group("telemetry")
        .middleware(RequestLog)
        .middleware(DeviceAuth::from_env());

    telemetry.register(
        RouteDef::new(
            "{device_id}/{metric}",
            IngestMetric::new(app.queue.clone(), ALERT_THRESHOLD),
        )
        .qos(QoS::AtLeastOnce)
        .shared(4),
    )?;

    Ok(())
}
