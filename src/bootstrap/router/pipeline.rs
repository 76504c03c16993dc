//! Middleware Pipeline Executor
//!
//! Builds and drives the onion chain around a route's terminal handler.
//! Middleware wrap the continuation: they may mutate the context before
//! advancing, transform the value coming back, decline to advance (early
//! termination), or fail. Advancing the same continuation twice is a
//! programmer error and is reported as `DispatchError::DoubleAdvance`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::context::MessageContext;
use super::route::Route;
use crate::error::DispatchError;

/// The terminal stage of a route's pipeline.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value>;
}

/// A pipeline stage wrapping the continuation to the rest of the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut MessageContext,
        next: Next<'_>,
    ) -> Result<Value, DispatchError>;
}

/// Continuation handed to each middleware. Running it advances to the next
/// middleware in the stack, or the terminal handler when none remain.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    handler: &'a Arc<dyn Handler>,
    advanced: AtomicBool,
}

impl<'a> Next<'a> {
    fn new(remaining: &'a [Arc<dyn Middleware>], handler: &'a Arc<dyn Handler>) -> Self {
        Self {
            remaining,
            handler,
            advanced: AtomicBool::new(false),
        }
    }

    /// Advance the pipeline. May be called at most once per middleware
    /// invocation; a second call fails with `DoubleAdvance`.
    pub async fn run(&self, ctx: &mut MessageContext) -> Result<Value, DispatchError> {
        if self.advanced.swap(true, Ordering::SeqCst) {
            return Err(DispatchError::DoubleAdvance {
                route: ctx.route.pattern().to_string(),
            });
        }

        match self.remaining.split_first() {
            Some((middleware, rest)) => {
                middleware.handle(ctx, Next::new(rest, self.handler)).await
            }
            None => self
                .handler
                .handle(ctx)
                .await
                .map_err(|source| DispatchError::Handler {
                    route: ctx.route.pattern().to_string(),
                    source,
                }),
        }
    }
}

/// Run a route's full middleware stack around its handler.
pub async fn run_pipeline(
    route: &Route,
    ctx: &mut MessageContext,
) -> Result<Value, DispatchError> {
    Next::new(route.middleware(), route.handler()).run(ctx).await
}
