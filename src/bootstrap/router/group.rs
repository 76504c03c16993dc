//! Route Groups
//!
//! A scoped builder that applies a topic prefix and a middleware stack to
//! every route registered through it. Scopes nest; composition is
//! outermost-first, and a scope closes implicitly when it is dropped.

use std::sync::Arc;

use super::pipeline::{Handler, Middleware};
use super::route::RouteDef;
use super::table::Router;
use crate::error::RouteResult;

pub struct GroupScope<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl<'r> GroupScope<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: String) -> Self {
        Self {
            router,
            prefix,
            middleware: Vec::new(),
        }
    }

    /// Append a middleware applied to every route in this scope, before any
    /// route-local middleware.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Open a nested scope. The child's prefix and middleware compose after
    /// this scope's own.
    pub fn group(&mut self, prefix: impl Into<String>) -> GroupScope<'_> {
        GroupScope {
            prefix: join_prefix(&self.prefix, &prefix.into()),
            middleware: self.middleware.clone(),
            router: &mut *self.router,
        }
    }

    /// Register a route within this scope.
    pub fn register(&mut self, mut def: RouteDef) -> RouteResult<()> {
        def.pattern = join_prefix(&self.prefix, &def.pattern);

        let mut middleware = self.middleware.clone();
        middleware.extend(def.middleware);
        def.middleware = middleware;

        self.router.register(def)
    }

    /// Shorthand for registering a bare route with default options.
    pub fn on<H: Handler + 'static>(
        &mut self,
        pattern: impl Into<String>,
        handler: H,
    ) -> RouteResult<()> {
        self.register(RouteDef::new(pattern, handler))
    }
}

/// An empty prefix concatenates to nothing.
fn join_prefix(prefix: &str, pattern: &str) -> String {
    if prefix.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", prefix, pattern)
    }
}
