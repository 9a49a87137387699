use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored inference result. Created exactly once per successfully processed
/// image and never updated.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub image_id: Uuid,
    pub user_id: Uuid,
    pub prediction_data: serde_json::Value,
    pub created_at: OffsetDateTime,
}

impl Prediction {
    pub async fn create(
        db: &PgPool,
        image_id: Uuid,
        user_id: Uuid,
        prediction_data: &serde_json::Value,
    ) -> anyhow::Result<Prediction> {
        let prediction = sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions (image_id, user_id, prediction_data)
            VALUES ($1, $2, $3)
            RETURNING id, image_id, user_id, prediction_data, created_at
            "#,
        )
        .bind(image_id)
        .bind(user_id)
        .bind(prediction_data)
        .fetch_one(db)
        .await?;
        Ok(prediction)
    }
}

/// Record an image whose processing attempts are exhausted.
pub async fn record_dead_letter(
    db: &PgPool,
    image_id: Uuid,
    user_id: Uuid,
    attempts: u32,
    last_error: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO dead_letters (image_id, user_id, attempts, last_error)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(image_id)
    .bind(user_id)
    .bind(attempts as i32)
    .bind(last_error)
    .execute(db)
    .await?;
    Ok(())
}
