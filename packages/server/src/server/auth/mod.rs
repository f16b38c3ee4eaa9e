pub mod jwt;
pub mod policy;

pub use jwt::{Claims, JwtService};
pub use policy::AccessPolicy;
