//!
//! Device Routes
//!
//! Status reports and config requests, served by the main session.

use crate::app::handlers::devices::{ConfigRequest, RecordStatus};
use crate::app::middleware::RequestLog;
use crate::bootstrap::context::AppContext;
use crate::bootstrap::router::{QoS, RouteDef, Router};
use crate::error::RouteResult;

pub fn register(app: &AppContext, router: &mut Router) -> RouteResult<()> {
    let mut devices = router.group("devices").middleware(RequestLog);

    devices.register(
        RouteDef::new("{device_id}/status", RecordStatus::new(app.queue.clone()))
            .qos(QoS::AtLeastOnce),
    )?;

    devices.register(RouteDef::new("{device_id}/config/get", ConfigRequest).qos(QoS::AtLeastOnce))?;

    Ok(())
}
