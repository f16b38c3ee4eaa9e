use axum::{extract::Extension, Json};

use crate::domains::analytics::activities::get_dashboard_snapshot;
use crate::domains::analytics::AnalyticsSnapshot;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

/// Public dashboard aggregates, served from the snapshot cache.
pub async fn public_analytics_handler(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<AnalyticsSnapshot>> {
    Ok(Json(get_dashboard_snapshot(&state.deps).await?))
}
