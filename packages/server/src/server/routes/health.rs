use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::domains::notifications::models::OutboxEntry;
use crate::server::app::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthReport {
    status: &'static str,
    store: StoreProbe,
    pool: PoolStats,
    /// Outbox entries not yet turned into notifications. A growing number
    /// means the sweeper is stuck.
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_backlog: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoreProbe {
    Ok,
    Error { reason: String },
}

#[derive(Debug, Serialize)]
pub struct PoolStats {
    open: u32,
    idle: usize,
    max: u32,
}

async fn probe_store(pool: &PgPool) -> StoreProbe {
    match tokio::time::timeout(PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => StoreProbe::Ok,
        Ok(Err(e)) => StoreProbe::Error {
            reason: format!("query failed: {}", e),
        },
        Err(_) => StoreProbe::Error {
            reason: format!("no answer within {}s", PROBE_TIMEOUT.as_secs()),
        },
    }
}

async fn notification_backlog(pool: &PgPool) -> Option<i64> {
    let mut conn = pool.acquire().await.ok()?;
    OutboxEntry::pending_count(&mut conn).await.ok()
}

/// Liveness and store reachability. 503 when Postgres does not answer.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthReport>) {
    let pool = &state.deps.db_pool;
    let store = probe_store(pool).await;

    let (code, status, backlog) = match store {
        StoreProbe::Ok => (StatusCode::OK, "healthy", notification_backlog(pool).await),
        StoreProbe::Error { .. } => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", None),
    };

    let report = HealthReport {
        status,
        store,
        pool: PoolStats {
            open: pool.size(),
            idle: pool.num_idle(),
            max: pool.options().get_max_connections(),
        },
        notification_backlog: backlog,
    };
    (code, Json(report))
}
