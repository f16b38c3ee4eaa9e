use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CivicResult, IssueId, UpvoteId, UserId};
use crate::domains::issues::models::Issue;

/// One user's endorsement of one issue. The row existing is the vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Upvote {
    pub id: UpvoteId,
    pub issue_id: IssueId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Upvote {
    /// Insert the pair unless it already exists. `None` means another
    /// transaction got there first.
    pub async fn insert(
        issue_id: IssueId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_upvotes (id, issue_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (issue_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(UpvoteId::new())
        .bind(issue_id)
        .bind(user_id)
        .bind(created_at)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Delete the pair if present, returning the removed row.
    pub async fn remove(
        issue_id: IssueId,
        user_id: UserId,
        conn: &mut PgConnection,
    ) -> CivicResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "DELETE FROM issue_upvotes WHERE issue_id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(issue_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn exists(issue_id: IssueId, user_id: UserId, pool: &PgPool) -> CivicResult<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS(SELECT 1 FROM issue_upvotes WHERE issue_id = $1 AND user_id = $2)",
        )
        .bind(issue_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Live rows for an issue; always equal to `issues.upvote_count`.
    pub async fn count_for_issue(issue_id: IssueId, pool: &PgPool) -> CivicResult<i64> {
        let (count,) =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM issue_upvotes WHERE issue_id = $1")
                .bind(issue_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Move the denormalized counter by `delta`. Only the ledger calls this,
    /// in the same transaction as the row change.
    pub async fn adjust_issue_counter(
        issue_id: IssueId,
        delta: i32,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Issue> {
        sqlx::query_as::<_, Issue>(
            r#"
            UPDATE issues
            SET upvote_count = upvote_count + $2,
                updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(delta)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }
}
