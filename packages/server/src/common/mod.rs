// Common types and utilities shared across the application

pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod types;

pub use entity_ids::*;
pub use errors::{CivicError, CivicResult};
pub use id::Id;
pub use types::*;
