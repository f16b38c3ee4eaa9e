//! Dashboard analytics served cache-aside from `analytics_cache`.

pub mod activities;
pub mod models;

pub use models::{AnalyticsSnapshot, DashboardPayload, DepartmentPerformance};
