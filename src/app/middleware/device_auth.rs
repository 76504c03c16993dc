//! Device token middleware
//!
//! Rejects messages whose JSON payload lacks the expected `token` field,
//! terminating the pipeline early without invoking the handler. With no
//! token configured, every message passes.
//!
//! Requires: JSON payload with `token`. Adds: nothing.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::bootstrap::router::{MessageContext, Middleware, Next};
use crate::error::DispatchError;

pub struct DeviceAuth {
    token: String,
}

impl DeviceAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("DEVICE_AUTH_TOKEN").unwrap_or_default())
    }
}

#[async_trait]
impl Middleware for DeviceAuth {
    async fn handle(
        &self,
        ctx: &mut MessageContext,
        next: Next<'_>,
    ) -> Result<Value, DispatchError> {
        if self.token.is_empty() {
            return next.run(ctx).await;
        }

        let presented = ctx
            .payload
            .as_json()
            .and_then(|value| value.get("token"))
            .and_then(Value::as_str);

        if presented != Some(self.token.as_str()) {
            warn!(topic = %ctx.topic, "rejecting message with missing or bad token");
            return Ok(json!({ "error": "unauthorized" }));
        }

        next.run(ctx).await
    }
}
