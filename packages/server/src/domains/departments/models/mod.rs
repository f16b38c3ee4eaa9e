pub mod department;
pub mod staff;

pub use department::{Department, DepartmentCatalog};
pub use staff::DepartmentStaff;
