use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{debug, info};

use crate::common::CivicResult;
use crate::domains::analytics::models::{compute_dashboard, AnalyticsSnapshot};
use crate::kernel::ServerDeps;

/// Cache-aside read of the dashboard aggregates.
///
/// A current snapshot is returned as stored. On a miss one caller takes the
/// per-key lease and recomputes; callers that find the lease taken get the
/// previous snapshot if there is one, and otherwise wait for the recompute
/// and read its result.
pub async fn get_dashboard_snapshot(deps: &ServerDeps) -> CivicResult<AnalyticsSnapshot> {
    let key = deps.analytics_cache_key.as_str();
    let now = deps.clock.now();
    let mut tx = deps.db_pool.begin().await?;

    if let Some(snapshot) = AnalyticsSnapshot::find_current(key, now, &mut *tx).await? {
        debug!(cache_key = key, "Analytics cache hit");
        return Ok(snapshot);
    }

    if AnalyticsSnapshot::try_lease(key, &mut *tx).await? {
        // Someone may have finished a recompute between the miss and the lease.
        let snapshot = match AnalyticsSnapshot::find_current(key, now, &mut *tx).await? {
            Some(snapshot) => snapshot,
            None => recompute(key, now, deps, &mut *tx).await?,
        };
        tx.commit().await?;
        return Ok(snapshot);
    }

    if let Some(stale) = AnalyticsSnapshot::find_latest(key, &mut *tx).await? {
        debug!(
            cache_key = key,
            expired_at = %stale.expires_at,
            "Recompute in flight, serving previous snapshot"
        );
        return Ok(stale);
    }

    AnalyticsSnapshot::wait_for_lease(key, &mut *tx).await?;
    let snapshot = match AnalyticsSnapshot::find_current(key, now, &mut *tx).await? {
        Some(snapshot) => snapshot,
        None => recompute(key, now, deps, &mut *tx).await?,
    };
    tx.commit().await?;
    Ok(snapshot)
}

async fn recompute(
    key: &str,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    conn: &mut PgConnection,
) -> CivicResult<AnalyticsSnapshot> {
    let stats = AnalyticsSnapshot::load_issue_stats(conn).await?;
    let payload = compute_dashboard(&stats, &deps.catalog);
    let snapshot =
        AnalyticsSnapshot::replace(key, payload, now, now + deps.analytics_ttl, conn).await?;

    info!(
        cache_key = key,
        issues = stats.len(),
        expires_at = %snapshot.expires_at,
        "Analytics snapshot recomputed"
    );
    Ok(snapshot)
}
