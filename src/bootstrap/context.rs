//! Application Context
//!
//! Explicit handle bundle threaded through construction of the session, the
//! worker processes, and the queue worker loops. There are no module-level
//! singletons: tests construct their own context around test drivers.

use std::sync::Arc;

use crate::bootstrap::queue::job::JobRegistry;
use crate::bootstrap::queue::QueueManager;

#[derive(Clone)]
pub struct AppContext {
    pub queue: Arc<QueueManager>,
    pub jobs: Arc<JobRegistry>,
}

impl AppContext {
    pub fn new(queue: Arc<QueueManager>, jobs: Arc<JobRegistry>) -> Self {
        Self { queue, jobs }
    }
}
