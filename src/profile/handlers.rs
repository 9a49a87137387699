use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{auth::jwt::AuthUser, error::ApiError, profile::repo::ProfilePhoto, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/upload", post(upload_photo))
        .route("/profile/photo", get(get_photo).delete(delete_photo))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024)) // 5MB
}

/// Upload or replace the caller's profile photo. The owner comes from the
/// token, not the request body.
#[instrument(skip(state, multipart))]
async fn upload_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut file: Option<(String, bytes::Bytes)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Unreadable file upload: {e}")))?;
            file = Some((content_type, data));
        }
    }

    let Some((content_type, data)) = file else {
        return Err(ApiError::Validation("No file uploaded.".into()));
    };
    if data.is_empty() {
        return Err(ApiError::Validation("No file uploaded.".into()));
    }

    ProfilePhoto::upsert(&state.db, user_id, &data, &content_type).await?;
    info!(%user_id, bytes = data.len(), "profile photo stored");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Profile photo uploaded successfully." })),
    ))
}

/// Return the stored bytes with their original content type.
#[instrument(skip(state))]
async fn get_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let photo = ProfilePhoto::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile photo not found.".into()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&photo.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    Ok((headers, photo.photo))
}

#[instrument(skip(state))]
async fn delete_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    if !ProfilePhoto::delete(&state.db, user_id).await? {
        return Err(ApiError::NotFound("Profile photo not found.".into()));
    }
    info!(%user_id, "profile photo removed");
    Ok(Json(json!({ "msg": "Profile photo removed successfully." })))
}
