//! API Module
//!
//! HTTP handlers and routing for the admin API: cache inspection,
//! invalidation and on-demand pre-generation.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
