//! Notification actions: outbox delivery and the per-user inbox.

mod dispatch;
mod inbox;

pub use dispatch::{
    deliver, dispatch_after_commit, enqueue, notify, run_outbox_sweeper, sweep, SWEEP_BATCH_SIZE,
};
pub use inbox::{list_notifications, mark_all_as_read, mark_as_read, unread_count};
