use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use duckpond_core::tasks::TaskItem;

use crate::api::require_user;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskItem>,
}

async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<TasksResponse>, AppError> {
    let username = require_user(&session).await?;
    let list = state.repo.load_tasks(&username).await?;
    Ok(Json(TasksResponse { tasks: list.tasks }))
}

async fn add_task(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddTaskRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = require_user(&session).await?;
    if req.text.is_empty() {
        return Err(AppError::Validation("task text required".into()));
    }
    let mut list = state.repo.load_tasks(&username).await?;
    let id = list.add(&req.text);
    state.repo.save_tasks(&username, &list).await?;
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

/// Toggling or deleting an unknown id is a silent no-op.
async fn toggle_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = require_user(&session).await?;
    let mut list = state.repo.load_tasks(&username).await?;
    list.toggle(id);
    state.repo.save_tasks(&username, &list).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = require_user(&session).await?;
    let mut list = state.repo.load_tasks(&username).await?;
    list.remove(id);
    state.repo.save_tasks(&username, &list).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(add_task))
        .route("/tasks/{id}/toggle", post(toggle_task))
        .route("/tasks/{id}", axum::routing::delete(delete_task))
}
