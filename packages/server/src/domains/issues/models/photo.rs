use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CivicResult, IssueId, PhotoId, UserId};

/// Photo or video attached to an issue. The URL comes from the blob store and
/// is stored verbatim, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IssuePhoto {
    pub id: PhotoId,
    pub issue_id: IssueId,
    pub photo_url: String,
    pub caption: Option<String>,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl IssuePhoto {
    pub async fn insert(&self, conn: &mut PgConnection) -> CivicResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issue_photos (id, issue_id, photo_url, caption, uploaded_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.issue_id)
        .bind(&self.photo_url)
        .bind(&self.caption)
        .bind(self.uploaded_by)
        .bind(self.created_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_issue(issue_id: IssueId, pool: &PgPool) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM issue_photos WHERE issue_id = $1 ORDER BY created_at, id",
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
