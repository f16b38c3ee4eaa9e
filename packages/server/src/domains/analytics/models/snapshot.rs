use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgConnection;

use super::{DashboardPayload, IssueStat};
use crate::common::{CivicResult, SnapshotId};

/// Cached dashboard aggregates. The newest unexpired row for a key is the
/// current one; writing a new row removes the older ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub id: SnapshotId,
    pub cache_key: String,
    #[sqlx(rename = "data")]
    pub payload: Json<DashboardPayload>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    pub async fn find_current(
        cache_key: &str,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM analytics_cache
            WHERE cache_key = $1 AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(cache_key)
        .bind(now)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Newest row for the key, expired or not.
    pub async fn find_latest(
        cache_key: &str,
        conn: &mut PgConnection,
    ) -> CivicResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM analytics_cache WHERE cache_key = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(cache_key)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Write a new snapshot and drop the ones it supersedes.
    pub async fn replace(
        cache_key: &str,
        payload: DashboardPayload,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        let snapshot = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO analytics_cache (id, cache_key, data, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(SnapshotId::new())
        .bind(cache_key)
        .bind(Json(payload))
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM analytics_cache WHERE cache_key = $1 AND id <> $2")
            .bind(cache_key)
            .bind(snapshot.id)
            .execute(&mut *conn)
            .await?;

        Ok(snapshot)
    }

    /// Take the per-key recompute lease if free. Released at transaction end.
    pub async fn try_lease(cache_key: &str, conn: &mut PgConnection) -> CivicResult<bool> {
        let (acquired,) =
            sqlx::query_as::<_, (bool,)>("SELECT pg_try_advisory_xact_lock(hashtext($1))")
                .bind(cache_key)
                .fetch_one(conn)
                .await?;
        Ok(acquired)
    }

    /// Wait for the per-key recompute lease.
    pub async fn wait_for_lease(cache_key: &str, conn: &mut PgConnection) -> CivicResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(cache_key)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn load_issue_stats(conn: &mut PgConnection) -> CivicResult<Vec<IssueStat>> {
        sqlx::query_as::<_, IssueStat>(
            "SELECT category, status, assigned_department, created_at, resolved_at FROM issues",
        )
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }
}
