// Civic Issues - API Core
//
// Backend for citizen-reported civic issues: the issue lifecycle, department
// routing, upvotes, notifications and cached dashboard analytics.
//
// Business logic lives per-domain in domains/*/activities; the axum server in
// server/ is a thin transport over those activities.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
