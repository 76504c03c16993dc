//! Message Context
//!
//! The value threaded through the middleware pipeline and into the terminal
//! handler. Middleware may attach additional values through the extensions
//! map; downstream consumers must tolerate absent keys.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::route::Route;
use crate::bootstrap::session::client::Publisher;

/// A message body, decoded as JSON when possible.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    /// Raw bytes, kept when the body is not valid UTF-8 JSON.
    Raw(Vec<u8>),
}

impl Payload {
    /// Attempt JSON decoding, falling back to the raw bytes.
    pub fn decode(bytes: &[u8]) -> Payload {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(bytes.to_vec()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// Deserialize the payload into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        match self {
            Payload::Json(value) => Ok(serde_json::from_value(value.clone())?),
            Payload::Raw(bytes) => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

/// Context carried through the pipeline for one delivered message.
pub struct MessageContext {
    /// Delivered topic, with any `$share/<group>/` prefix already stripped.
    pub topic: String,
    pub payload: Payload,
    /// Placeholder captures from the matched pattern.
    pub params: HashMap<String, String>,
    /// Handle for publishing responses back to the broker.
    pub publisher: Arc<dyn Publisher>,
    /// The route that matched this message.
    pub route: Arc<Route>,
    extensions: HashMap<String, Value>,
}

impl MessageContext {
    pub fn new(
        topic: String,
        payload: Payload,
        params: HashMap<String, String>,
        publisher: Arc<dyn Publisher>,
        route: Arc<Route>,
    ) -> Self {
        Self {
            topic,
            payload,
            params,
            publisher,
            route,
            extensions: HashMap::new(),
        }
    }

    /// Convenience accessor for a single captured parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Attach a middleware-provided value.
    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Read a middleware-provided value, if present.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}
