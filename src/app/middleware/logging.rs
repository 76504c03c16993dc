//! Request logging middleware
//!
//! Stamps `received_at` (unix millis) into the context extensions for
//! downstream consumers and logs the outcome of every dispatch.
//!
//! Adds: `received_at`. Requires: nothing.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use crate::bootstrap::router::{MessageContext, Middleware, Next};
use crate::error::DispatchError;

pub struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(
        &self,
        ctx: &mut MessageContext,
        next: Next<'_>,
    ) -> Result<Value, DispatchError> {
        let started = std::time::Instant::now();
        ctx.set_extension("received_at", json!(Utc::now().timestamp_millis()));

        let result = next.run(ctx).await;

        debug!(
            topic = %ctx.topic,
            route = ctx.route.pattern(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "message processed"
        );
        result
    }
}
