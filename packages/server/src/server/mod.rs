// HTTP server setup (Axum, JSON over REST, SSE for live topics)
pub mod app;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;

pub use app::*;
