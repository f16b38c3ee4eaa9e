use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{AssignmentId, CivicResult, IssueId, UserId};

/// One entry in an issue's assignment history (department and/or staff).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IssueAssignmentRecord {
    pub id: AssignmentId,
    pub issue_id: IssueId,
    pub department_id: String,
    pub assigned_to: Option<UserId>,
    pub assigned_by: Option<UserId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IssueAssignmentRecord {
    pub async fn record(
        issue_id: IssueId,
        department_id: &str,
        assigned_to: Option<UserId>,
        assigned_by: Option<UserId>,
        notes: Option<&str>,
        created_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_assignments
                (id, issue_id, department_id, assigned_to, assigned_by, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(AssignmentId::new())
        .bind(issue_id)
        .bind(department_id)
        .bind(assigned_to)
        .bind(assigned_by)
        .bind(notes)
        .bind(created_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_assignments WHERE issue_id = $1 ORDER BY created_at, id",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
