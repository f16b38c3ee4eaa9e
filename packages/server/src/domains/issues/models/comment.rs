use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::IssueStatus;
use crate::common::{CivicResult, CommentId, IssueId, UserId};

/// Comment or status-transition audit entry. Immutable once written.
///
/// Rows with `old_status`/`new_status` set record a transition; both are set
/// or neither is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: CommentId,
    pub issue_id: IssueId,
    pub author_id: Option<UserId>,
    pub content: String,
    /// Visible to staff only.
    pub is_internal: bool,
    pub old_status: Option<IssueStatus>,
    pub new_status: Option<IssueStatus>,
    pub created_at: DateTime<Utc>,
}

impl IssueComment {
    pub fn comment(
        issue_id: IssueId,
        author_id: Option<UserId>,
        content: String,
        is_internal: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommentId::new(),
            issue_id,
            author_id,
            content,
            is_internal,
            old_status: None,
            new_status: None,
            created_at,
        }
    }

    pub fn status_change(
        issue_id: IssueId,
        author_id: Option<UserId>,
        from: IssueStatus,
        to: IssueStatus,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Status changed from {} to {}", from.label(), to.label()));
        Self {
            id: CommentId::new(),
            issue_id,
            author_id,
            content,
            is_internal: false,
            old_status: Some(from),
            new_status: Some(to),
            created_at,
        }
    }

    pub fn is_status_update(&self) -> bool {
        self.new_status.is_some()
    }

    pub async fn insert(&self, conn: &mut PgConnection) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_comments
                (id, issue_id, author_id, content, is_internal, old_status, new_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.issue_id)
        .bind(self.author_id)
        .bind(&self.content)
        .bind(self.is_internal)
        .bind(self.old_status)
        .bind(self.new_status)
        .bind(self.created_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Comments and audit entries for an issue in creation order.
    ///
    /// Ids are time-ordered, so `(created_at, id)` is a total order even when
    /// two entries share a timestamp.
    pub async fn find_for_issue(
        issue_id: IssueId,
        include_internal: bool,
        pool: &PgPool,
    ) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM issue_comments
            WHERE issue_id = $1
              AND ($2 OR is_internal = false)
            ORDER BY created_at, id
            "#,
        )
        .bind(issue_id)
        .bind(include_internal)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Status-transition entries only.
    pub async fn find_transitions(issue_id: IssueId, pool: &PgPool) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM issue_comments
            WHERE issue_id = $1 AND new_status IS NOT NULL
            ORDER BY created_at, id
            "#,
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
