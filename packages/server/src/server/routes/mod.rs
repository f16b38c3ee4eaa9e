// HTTP routes
pub mod analytics;
pub mod departments;
pub mod health;
pub mod issues;
pub mod notifications;
pub mod stream;

pub use analytics::*;
pub use departments::*;
pub use health::*;
pub use issues::*;
pub use notifications::*;
pub use stream::*;
