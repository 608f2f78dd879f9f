//! HTTP Service Adapters
//!
//! - `middleware`: axum binding of request instrumentation
//! - `routes`: user and flight handlers plus router assembly
//! - `server`: listener with graceful shutdown

pub mod middleware;
pub mod routes;
pub mod server;

pub use middleware::track_requests;
pub use routes::{AppState, IDEMPOTENCY_KEY_HEADER, build_router};
pub use server::ServiceServer;
