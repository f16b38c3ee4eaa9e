use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

pub use crate::common::IssueStatus;
use crate::common::{CivicError, CivicResult, IssueCategory, IssueId, Location, UserId};

// ============================================================================
// Enums
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "issue_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

// ============================================================================
// Issue Model
// ============================================================================

/// A reported civic problem and its lifecycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    #[sqlx(flatten)]
    pub location: Location,
    /// `None` when reported anonymously without an account.
    pub reported_by: Option<UserId>,
    pub assigned_department: String,
    pub assigned_staff: Option<UserId>,
    /// Denormalized; only the upvote ledger writes it.
    pub upvote_count: i32,
    pub comment_count: i32,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once, on entering `resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Closed filter over the issue list. Unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub reported_by: Option<UserId>,
    pub assigned_to: Option<UserId>,
}

impl Issue {
    /// Insert a fully-populated issue row.
    pub async fn insert(&self, conn: &mut PgConnection) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issues (
                id, title, description, category, priority, status,
                location_address, location_lat, location_lng,
                reported_by, assigned_department, assigned_staff,
                upvote_count, comment_count, is_anonymous,
                created_at, updated_at, resolved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.category)
        .bind(self.priority)
        .bind(self.status)
        .bind(&self.location.address)
        .bind(self.location.lat)
        .bind(self.location.lng)
        .bind(self.reported_by)
        .bind(&self.assigned_department)
        .bind(self.assigned_staff)
        .bind(self.upvote_count)
        .bind(self.comment_count)
        .bind(self.is_anonymous)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.resolved_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: IssueId, pool: &PgPool) -> CivicResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Like `find_by_id`, but an unknown id is `NotFound`.
    pub async fn require(id: IssueId, pool: &PgPool) -> CivicResult<Self> {
        Self::find_by_id(id, pool)
            .await?
            .ok_or_else(|| CivicError::not_found("issue", id))
    }

    /// Lock the issue row for the rest of the transaction.
    ///
    /// Serializes status transitions, field edits and upvote toggles on one
    /// issue: a second caller blocks here until the first commits, then sees
    /// the committed state.
    pub async fn lock(id: IssueId, conn: &mut PgConnection) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM issues WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| CivicError::not_found("issue", id))
    }

    /// Issues matching `filter`, newest first. `limit = None` returns everything.
    pub async fn list(
        filter: &IssueFilter,
        limit: Option<i64>,
        pool: &PgPool,
    ) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM issues
            WHERE ($1::issue_status IS NULL OR status = $1)
              AND ($2::issue_category IS NULL OR category = $2)
              AND ($3::uuid IS NULL OR reported_by = $3)
              AND ($4::uuid IS NULL OR assigned_staff = $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.status)
        .bind(filter.category)
        .bind(filter.reported_by)
        .bind(filter.assigned_to)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Write a validated status change.
    ///
    /// `resolved_at` is only ever filled when empty, so it keeps the moment the
    /// issue first became resolved.
    pub async fn apply_status(
        id: IssueId,
        status: IssueStatus,
        resolved_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE issues
            SET status = $2,
                resolved_at = COALESCE(resolved_at, $3),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(resolved_at)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn set_priority(
        id: IssueId,
        priority: IssuePriority,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE issues SET priority = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(priority)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn set_department(
        id: IssueId,
        department_id: &str,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE issues SET assigned_department = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(department_id)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn set_staff(
        id: IssueId,
        staff: Option<UserId>,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE issues SET assigned_staff = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(staff)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn increment_comment_count(
        id: IssueId,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE issues
            SET comment_count = comment_count + 1,
                updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Reporter to notify, if there is one.
    pub fn reporter(&self) -> Option<UserId> {
        self.reported_by
    }
}
