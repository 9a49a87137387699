use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Processing state of an uploaded image.
/// `uploaded -> submitted -> predicted | failed`, persisted on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Uploaded,
    Submitted,
    Predicted,
    Failed,
}

impl ImageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageStatus::Uploaded => "uploaded",
            ImageStatus::Submitted => "submitted",
            ImageStatus::Predicted => "predicted",
            ImageStatus::Failed => "failed",
        }
    }
}

/// Uploaded image record. The row is immutable after insert except for
/// `status`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub status: String,
    pub uploaded_at: OffsetDateTime,
}

impl Image {
    /// Insert the image bytes and return the row (without echoing the data
    /// column back).
    pub async fn create(
        db: &PgPool,
        filename: &str,
        content_type: &str,
        data: &[u8],
        user_id: Uuid,
    ) -> anyhow::Result<Image> {
        let image = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (filename, content_type, data, user_id, status)
            VALUES ($1, $2, $3, $4, 'uploaded')
            RETURNING id, filename, content_type, user_id, status, uploaded_at
            "#,
        )
        .bind(filename)
        .bind(content_type)
        .bind(data)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(image)
    }

    pub async fn set_status(db: &PgPool, id: Uuid, status: ImageStatus) -> anyhow::Result<()> {
        sqlx::query("UPDATE images SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_the_state_machine() {
        assert_eq!(ImageStatus::Uploaded.as_str(), "uploaded");
        assert_eq!(ImageStatus::Submitted.as_str(), "submitted");
        assert_eq!(ImageStatus::Predicted.as_str(), "predicted");
        assert_eq!(ImageStatus::Failed.as_str(), "failed");
    }
}
