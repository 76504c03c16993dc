pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;

pub use bootstrap::context::AppContext;
pub use bootstrap::queue;
pub use bootstrap::router;
pub use bootstrap::session;
pub use routes::build_router;
