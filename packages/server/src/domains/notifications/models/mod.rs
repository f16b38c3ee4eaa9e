pub mod notification;
pub mod outbox;

pub use notification::{Notification, NotificationType, DEFAULT_LIST_LIMIT};
pub use outbox::{Audience, NotificationEvent, OutboxEntry};
