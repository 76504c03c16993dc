//!
//! Routes Module
//!
//! Topic route definitions, one file per domain. Each file exposes a
//! `register` function and is listed in `route_files`; the loader merges
//! them into the master table in alphabetical order, skipping files that
//! fail to load.

pub mod devices;
pub mod telemetry;

use crate::bootstrap::context::AppContext;
use crate::bootstrap::router::{load, RouteFile, Router};

/// Registry of route-definition files. Adding a file means adding one entry
/// here; order does not matter, the loader sorts by name.
pub fn route_files() -> Vec<RouteFile> {
    vec![
        RouteFile {
            name: "devices",
            register: devices::register,
        },
        RouteFile {
            name: "telemetry",
            register: telemetry::register,
        },
    ]
}

/// Build the full route table. Each process (main session and every worker)
/// calls this independently at startup.
pub fn build_router(app: &AppContext) -> Router {
    load(app, &route_files())
}
