pub mod activities;
pub mod models;

pub use models::{Audience, Notification, NotificationEvent, NotificationType};
