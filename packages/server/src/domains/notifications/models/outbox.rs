use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::NotificationType;
use crate::common::{CivicError, CivicResult, IssueId, OutboxId, UserId};

/// Who a notification event is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Audience {
    User(UserId),
    /// Every member of the department's staff pool.
    Department(String),
}

/// A notification to be produced: type, audience, related issue and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub audience: Audience,
    pub kind: NotificationType,
    pub issue_id: Option<IssueId>,
    pub title: String,
    pub message: String,
}

impl NotificationEvent {
    pub fn to_user(
        user_id: UserId,
        kind: NotificationType,
        issue_id: Option<IssueId>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            audience: Audience::User(user_id),
            kind,
            issue_id,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn to_department(
        department_id: impl Into<String>,
        kind: NotificationType,
        issue_id: Option<IssueId>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            audience: Audience::Department(department_id.into()),
            kind,
            issue_id,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Pending notification event, written in the same transaction as the change
/// that caused it and removed once its notifications exist.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxEntry {
    pub id: OutboxId,
    pub audience_kind: String,
    pub audience_user: Option<UserId>,
    pub audience_department: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: NotificationType,
    pub issue_id: Option<IssueId>,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    pub async fn enqueue(
        event: &NotificationEvent,
        created_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<OutboxId> {
        let (kind, user, department) = match &event.audience {
            Audience::User(id) => ("user", Some(*id), None),
            Audience::Department(id) => ("department", None, Some(id.as_str())),
        };
        let id = OutboxId::new();
        sqlx::query(
            r#"
            INSERT INTO notification_outbox
                (id, audience_kind, audience_user, audience_department, type, issue_id,
                 title, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(kind)
        .bind(user)
        .bind(department)
        .bind(event.kind)
        .bind(event.issue_id)
        .bind(&event.title)
        .bind(&event.message)
        .bind(created_at)
        .execute(conn)
        .await?;
        Ok(id)
    }

    /// Lock specific entries, waiting for any other deliverer holding them.
    ///
    /// Entries already delivered (deleted) by someone else are simply absent.
    pub async fn claim(ids: &[OutboxId], conn: &mut PgConnection) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM notification_outbox
            WHERE id = ANY($1)
            ORDER BY created_at, id
            FOR UPDATE
            "#,
        )
        .bind(ids)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Claim up to `limit` of the oldest entries nobody else is delivering.
    pub async fn claim_batch(limit: i64, conn: &mut PgConnection) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM notification_outbox
            ORDER BY created_at, id
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: OutboxId, conn: &mut PgConnection) -> CivicResult<()> {
        sqlx::query("DELETE FROM notification_outbox WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn pending_count(conn: &mut PgConnection) -> CivicResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM notification_outbox")
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    pub fn audience(&self) -> CivicResult<Audience> {
        match (self.audience_kind.as_str(), self.audience_user, &self.audience_department) {
            ("user", Some(user), _) => Ok(Audience::User(user)),
            ("department", _, Some(department)) => Ok(Audience::Department(department.clone())),
            (other, _, _) => Err(CivicError::Internal(anyhow::anyhow!(
                "outbox entry {} has malformed audience '{}'",
                self.id,
                other
            ))),
        }
    }
}
