//! Route Table
//!
//! Ordered collection of routes with first-match-wins dispatch. Built once
//! at startup by the loader, read-only afterwards.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::context::{MessageContext, Payload};
use super::group::GroupScope;
use super::pattern::TopicPattern;
use super::pipeline::{run_pipeline, Handler};
use super::route::{Route, RouteDef};
use crate::bootstrap::session::client::Publisher;
use crate::error::{DispatchError, RouteResult};

/// The routing table. Lookup is first-match by insertion order.
#[derive(Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route. Fails when the pattern does not compile; the table
    /// is left untouched in that case.
    pub fn register(&mut self, def: RouteDef) -> RouteResult<()> {
        let matcher = TopicPattern::compile(&def.pattern)?;
        self.routes.push(Arc::new(Route::from_def(def, matcher)));
        Ok(())
    }

    /// Shorthand for registering a bare route with default options.
    pub fn on<H: Handler + 'static>(
        &mut self,
        pattern: impl Into<String>,
        handler: H,
    ) -> RouteResult<()> {
        self.register(RouteDef::new(pattern, handler))
    }

    /// Open a scoped group. Registrations through the scope prepend `prefix`
    /// and the scope's middleware to every child route.
    pub fn group(&mut self, prefix: impl Into<String>) -> GroupScope<'_> {
        GroupScope::new(self, prefix.into())
    }

    /// Append all routes of another table, preserving their order.
    pub fn merge(&mut self, other: Router) {
        self.routes.extend(other.routes);
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Routes served by the main session.
    pub fn standard_routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter().filter(|r| !r.shared())
    }

    /// Routes served by shared-subscription worker processes.
    pub fn shared_routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter().filter(|r| r.shared())
    }

    /// Total worker processes needed to serve the shared routes.
    pub fn total_worker_count(&self) -> usize {
        self.shared_routes().map(|r| r.workers()).sum()
    }

    /// Find the first route matching a topic, along with its captures.
    pub fn match_topic(
        &self,
        topic: &str,
    ) -> Option<(Arc<Route>, std::collections::HashMap<String, String>)> {
        for route in &self.routes {
            if let Some(params) = route.matcher().match_topic(topic) {
                return Some((route.clone(), params));
            }
        }
        None
    }

    /// Dispatch a delivered message through the first matching route's
    /// pipeline. The returned value is the pipeline result, surfaced for
    /// observability and tests; sessions discard it.
    pub async fn dispatch(
        &self,
        topic: &str,
        payload: Payload,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Value, DispatchError> {
        let (route, params) = self
            .match_topic(topic)
            .ok_or_else(|| DispatchError::NoRoute(topic.to_string()))?;

        debug!(topic, route = route.pattern(), "dispatching message");

        let mut ctx =
            MessageContext::new(topic.to_string(), payload, params, publisher, route.clone());
        run_pipeline(&route, &mut ctx).await
    }
}
