// Business domains
pub mod analytics;
pub mod departments;
pub mod issues;
pub mod notifications;
pub mod upvotes;
