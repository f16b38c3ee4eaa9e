use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CivicResult, UserId};

/// Staff member on a department's roster (the notification pool for
/// new-assignment events).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentStaff {
    pub department_id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl DepartmentStaff {
    /// Add a user to a department roster. Re-adding is a no-op.
    pub async fn add(department_id: &str, user_id: UserId, pool: &PgPool) -> CivicResult<()> {
        sqlx::query(
            "INSERT INTO department_staff (department_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (department_id, user_id) DO NOTHING",
        )
        .bind(department_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove(department_id: &str, user_id: UserId, pool: &PgPool) -> CivicResult<()> {
        sqlx::query("DELETE FROM department_staff WHERE department_id = $1 AND user_id = $2")
            .bind(department_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Staff pool for a department, in roster order.
    pub async fn user_ids_for(
        department_id: &str,
        conn: &mut PgConnection,
    ) -> CivicResult<Vec<UserId>> {
        let rows = sqlx::query_as::<_, (UserId,)>(
            r#"
            SELECT user_id
            FROM department_staff
            WHERE department_id = $1
            ORDER BY created_at, user_id
            "#,
        )
        .bind(department_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn find_by_department(department_id: &str, pool: &PgPool) -> CivicResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM department_staff WHERE department_id = $1 ORDER BY created_at, user_id",
        )
        .bind(department_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
