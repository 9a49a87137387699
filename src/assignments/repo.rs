use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Assignment {
    pub async fn create(
        db: &PgPool,
        title: &str,
        description: Option<&str>,
        due_date: OffsetDateTime,
    ) -> anyhow::Result<Assignment> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (title, description, due_date)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, due_date, completed, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(due_date)
        .fetch_one(db)
        .await?;
        Ok(assignment)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, title, description, due_date, completed, created_at
            FROM assignments
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Flip the completion flag. None for an unknown id.
    pub async fn toggle_completed(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET completed = NOT completed
            WHERE id = $1
            RETURNING id, title, description, due_date, completed, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(assignment)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
