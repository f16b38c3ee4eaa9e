//! Departments domain - static catalog, staff rosters and issue routing.

pub mod models;
pub mod router;

pub use models::{Department, DepartmentCatalog, DepartmentStaff};
pub use router::route;
