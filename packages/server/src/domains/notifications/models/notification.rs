use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CivicResult, IssueId, NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    IssueUpdate,
    Assignment,
    Comment,
    Upvote,
    Resolved,
}

/// A message for one user. Append-only; only `is_read` changes after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[sqlx(rename = "user_id")]
    pub recipient_user_id: UserId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[sqlx(rename = "issue_id")]
    pub related_issue_id: Option<IssueId>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Default page size for a user's notification list.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

impl Notification {
    pub async fn insert(&self, conn: &mut PgConnection) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO notifications
                (id, user_id, type, issue_id, title, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.recipient_user_id)
        .bind(self.kind)
        .bind(self.related_issue_id)
        .bind(&self.title)
        .bind(&self.message)
        .bind(self.is_read)
        .bind(self.created_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Newest first, capped at `limit`.
    pub async fn find_for_user(
        user_id: UserId,
        limit: i64,
        pool: &PgPool,
    ) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM notifications WHERE issue_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_unread(user_id: UserId, pool: &PgPool) -> CivicResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read. Returns whether anything changed; marking an
    /// already-read (or someone else's, or unknown) notification changes nothing.
    pub async fn mark_read(
        id: NotificationId,
        user_id: UserId,
        pool: &PgPool,
    ) -> CivicResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1 AND user_id = $2 AND is_read = false
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification for a user read. Returns how many changed.
    pub async fn mark_all_read(user_id: UserId, pool: &PgPool) -> CivicResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
