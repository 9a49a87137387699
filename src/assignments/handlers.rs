use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{assignments::repo::Assignment, error::ApiError, state::AppState};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/:id",
            put(toggle_assignment).delete(delete_assignment),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
}

#[instrument(skip(state, payload))]
async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required.".into()));
    }
    let assignment = Assignment::create(
        &state.db,
        payload.title.trim(),
        payload.description.as_deref(),
        payload.due_date,
    )
    .await?;
    info!(assignment_id = %assignment.id, "assignment created");
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[instrument(skip(state))]
async fn list_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
    Ok(Json(Assignment::list(&state.db).await?))
}

#[instrument(skip(state))]
async fn toggle_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, ApiError> {
    let assignment = Assignment::toggle_completed(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".into()))?;
    Ok(Json(assignment))
}

#[instrument(skip(state))]
async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    Assignment::delete(&state.db, id).await?;
    Ok(Json(json!({ "msg": "Assignment deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_rfc3339_due_date() {
        let raw = r#"{"title":"Essay","dueDate":"2026-09-01T12:00:00Z"}"#;
        let req: CreateAssignmentRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.title, "Essay");
        assert!(req.description.is_none());
        assert_eq!(req.due_date.year(), 2026);
    }

    #[test]
    fn assignment_serializes_camel_case() {
        let a = Assignment {
            id: Uuid::new_v4(),
            title: "Lab".into(),
            description: None,
            due_date: OffsetDateTime::UNIX_EPOCH,
            completed: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let v = serde_json::to_value(&a).unwrap();
        assert!(v.get("dueDate").is_some());
        assert!(v.get("createdAt").is_some());
    }
}
