use axum::{extract::Extension, Json};

use crate::domains::departments::Department;
use crate::server::app::AppState;

pub async fn list_departments_handler(
    Extension(state): Extension<AppState>,
) -> Json<Vec<Department>> {
    Json(state.deps.catalog.departments().to_vec())
}
