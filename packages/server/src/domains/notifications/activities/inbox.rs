use tracing::{debug, info};

use crate::common::{CivicResult, NotificationId, UserId};
use crate::domains::notifications::models::{Notification, DEFAULT_LIST_LIMIT};
use crate::kernel::ServerDeps;

/// A user's notifications, newest first. `limit` defaults to 50.
pub async fn list_notifications(
    user_id: UserId,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> CivicResult<Vec<Notification>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0);
    let notifications = Notification::find_for_user(user_id, limit, &deps.db_pool).await?;
    debug!(user_id = %user_id, count = notifications.len(), "Listed notifications");
    Ok(notifications)
}

pub async fn unread_count(user_id: UserId, deps: &ServerDeps) -> CivicResult<i64> {
    Notification::count_unread(user_id, &deps.db_pool).await
}

/// Idempotent: an already-read notification stays read and is not an error.
pub async fn mark_as_read(
    notification_id: NotificationId,
    user_id: UserId,
    deps: &ServerDeps,
) -> CivicResult<()> {
    let changed = Notification::mark_read(notification_id, user_id, &deps.db_pool).await?;
    debug!(
        notification_id = %notification_id,
        user_id = %user_id,
        changed,
        "Marked notification read"
    );
    Ok(())
}

pub async fn mark_all_as_read(user_id: UserId, deps: &ServerDeps) -> CivicResult<()> {
    let changed = Notification::mark_all_read(user_id, &deps.db_pool).await?;
    info!(user_id = %user_id, changed, "Marked all notifications read");
    Ok(())
}
