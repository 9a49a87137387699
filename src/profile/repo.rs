use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Single profile photo per user, stored inline.
#[derive(Debug, Clone, FromRow)]
pub struct ProfilePhoto {
    pub user_id: Uuid,
    pub photo: Vec<u8>,
    pub content_type: String,
}

impl ProfilePhoto {
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        photo: &[u8],
        content_type: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profile_photos (user_id, photo, content_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET photo = $2, content_type = $3, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(photo)
        .bind(content_type)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<ProfilePhoto>> {
        let photo = sqlx::query_as::<_, ProfilePhoto>(
            "SELECT user_id, photo, content_type FROM profile_photos WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(photo)
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM profile_photos WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
