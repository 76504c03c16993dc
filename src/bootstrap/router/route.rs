//! Route definition and the immutable registered form.

use std::sync::Arc;

use rumqttc::QoS;

use super::pattern::TopicPattern;
use super::pipeline::{Handler, Middleware};

/// A route under construction, built with chained options and handed to
/// `Router::register`.
pub struct RouteDef {
    pub(crate) pattern: String,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) qos: QoS,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) shared: bool,
    pub(crate) workers: usize,
}

impl RouteDef {
    pub fn new<H: Handler + 'static>(pattern: impl Into<String>, handler: H) -> Self {
        Self {
            pattern: pattern.into(),
            handler: Arc::new(handler),
            qos: QoS::AtMostOnce,
            middleware: Vec::new(),
            shared: false,
            workers: 1,
        }
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    /// Append a route-local middleware. Group middleware always runs first.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Mark the route as a shared subscription served by `workers` worker
    /// processes. A count of zero is clamped to one.
    pub fn shared(mut self, workers: usize) -> Self {
        self.shared = true;
        self.workers = workers.max(1);
        self
    }
}

/// A registered route. Immutable after registration.
pub struct Route {
    matcher: TopicPattern,
    handler: Arc<dyn Handler>,
    qos: QoS,
    middleware: Vec<Arc<dyn Middleware>>,
    shared: bool,
    workers: usize,
}

impl Route {
    pub(crate) fn from_def(def: RouteDef, matcher: TopicPattern) -> Self {
        Self {
            matcher,
            handler: def.handler,
            qos: def.qos,
            middleware: def.middleware,
            shared: def.shared,
            workers: def.workers,
        }
    }

    /// The full composed pattern string.
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// The broker subscription filter for this route.
    pub fn filter(&self) -> &str {
        self.matcher.filter()
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn shared(&self) -> bool {
        self.shared
    }

    /// Worker count for shared routes; meaningless when `shared` is false.
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn matcher(&self) -> &TopicPattern {
        &self.matcher
    }

    pub(crate) fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub(crate) fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}
