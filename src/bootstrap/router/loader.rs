//! Route Registry Loader
//!
//! Route definitions live in per-team files under `src/routes/`; each file
//! exposes a `register` function and is listed in the crate's route-file
//! registry. The loader merges them into one table in alphabetical order of
//! file name, preserving registration order within a file.
//!
//! A file that fails to register is logged and skipped in its entirety (its
//! partial registrations are discarded) so one broken file cannot take the
//! rest of the fleet down.

use tracing::{info, warn};

use super::table::Router;
use crate::bootstrap::context::AppContext;
use crate::error::RouteResult;

/// One route-definition file: a stable name and its registration entrypoint.
#[derive(Clone, Copy)]
pub struct RouteFile {
    pub name: &'static str,
    pub register: fn(&AppContext, &mut Router) -> RouteResult<()>,
}

/// Build the master route table from a set of route files.
pub fn load(app: &AppContext, files: &[RouteFile]) -> Router {
    let mut sorted: Vec<RouteFile> = files.to_vec();
    sorted.sort_by_key(|f| f.name);

    let mut router = Router::new();
    for file in &sorted {
        // Register into a staging table so a mid-file failure discards the
        // file's earlier registrations as well.
        let mut staging = Router::new();
        match (file.register)(app, &mut staging) {
            Ok(()) => {
                info!(file = file.name, routes = staging.routes().len(), "loaded route file");
                router.merge(staging);
            }
            Err(e) => {
                warn!(file = file.name, error = %e, "skipping route file that failed to load");
            }
        }
    }
    router
}
