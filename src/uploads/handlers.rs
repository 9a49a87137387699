use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{error::ApiError, pipeline::task::ProcessingTask, state::AppState, uploads::repo::Image};

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// Persist the image and answer immediately; prediction runs detached and
/// reports back through the owner's realtime room. A processing failure
/// never affects this response.
#[instrument(skip(state, multipart))]
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut user_id: Option<Uuid> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("userId") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| ApiError::Validation("User ID is required".into()))?;
                user_id = Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| ApiError::Validation("Invalid user ID".into()))?,
                );
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Unreadable file upload: {e}")))?;
                file = Some((filename, content_type, data));
            }
            _ => {}
        }
    }

    let Some(user_id) = user_id else {
        return Err(ApiError::Validation("User ID is required".into()));
    };
    let Some((filename, content_type, data)) = file else {
        return Err(ApiError::Validation("No file uploaded".into()));
    };
    if data.is_empty() {
        return Err(ApiError::Validation("No file uploaded".into()));
    }

    let image = Image::create(&state.db, &filename, &content_type, &data, user_id).await?;
    info!(image_id = %image.id, %user_id, %filename, "image uploaded");

    // Detached from this request from here on.
    ProcessingTask::new(state.clone(), image.id, user_id, content_type, data).spawn();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "Image uploaded successfully",
            "imageId": image.id,
        })),
    ))
}
