//! Per-user notification inbox. Every endpoint requires a signed-in user.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::NotificationId;
use crate::domains::notifications::activities as inbox;
use crate::domains::notifications::Notification;
use crate::server::app::AppState;
use crate::server::auth::AccessPolicy;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

pub async fn list_notifications_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let user = user.map(|Extension(u)| u);
    let user = AccessPolicy::require_user(user.as_ref())?;
    let notifications = inbox::list_notifications(user.user_id, query.limit, &state.deps).await?;
    Ok(Json(notifications))
}

pub async fn unread_count_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let user = user.map(|Extension(u)| u);
    let user = AccessPolicy::require_user(user.as_ref())?;
    let count = inbox::unread_count(user.user_id, &state.deps).await?;
    Ok(Json(UnreadCountResponse { count }))
}

pub async fn mark_read_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(notification_id): Path<NotificationId>,
) -> ApiResult<StatusCode> {
    let user = user.map(|Extension(u)| u);
    let user = AccessPolicy::require_user(user.as_ref())?;
    inbox::mark_as_read(notification_id, user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<StatusCode> {
    let user = user.map(|Extension(u)| u);
    let user = AccessPolicy::require_user(user.as_ref())?;
    inbox::mark_all_as_read(user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}
