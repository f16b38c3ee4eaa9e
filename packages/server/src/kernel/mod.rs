//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use deps::{DeliveryMode, ServerDeps, DASHBOARD_CACHE_KEY};
pub use stream_hub::{HubMessage, StreamHub, Subscription, Topic};
pub use test_dependencies::{ManualClock, TestDependencies};
pub use traits::*;
