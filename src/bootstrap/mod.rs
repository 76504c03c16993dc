//! Bootstrap module
//!
//! Contains core framework components:
//! - Router (pattern compiler, route table, groups, middleware pipeline, loader)
//! - Sessions (broker client, main session, worker processes, supervisor)
//! - Queue (job contract, drivers, manager, worker loop)
//! - Application context threaded through construction

pub(crate) mod backoff;
pub mod context;
pub mod queue;
pub mod router;
pub mod session;
