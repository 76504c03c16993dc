//! Router Module
//!
//! Topic pattern compilation, the ordered route table, scoped groups, the
//! middleware pipeline, and the route-file loader.

pub mod context;
pub mod group;
pub mod loader;
pub mod pattern;
pub mod pipeline;
pub mod route;
pub mod table;

pub use context::{MessageContext, Payload};
pub use group::GroupScope;
pub use loader::{load, RouteFile};
pub use pattern::TopicPattern;
pub use pipeline::{Handler, Middleware, Next};
pub use route::{Route, RouteDef};
pub use table::Router;

// Routes declare delivery guarantees with the client library's QoS type.
pub use rumqttc::QoS;
