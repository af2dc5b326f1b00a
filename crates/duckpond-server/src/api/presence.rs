use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::require_user;
use crate::error::AppError;
use crate::repo::ActiveUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveUsersResponse {
    pub users: Vec<ActiveUser>,
}

async fn update_status(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let username = require_user(&session).await?;
    state.repo.set_status(&username, &req.status).await?;
    Ok(Json(UpdateStatusResponse {
        success: true,
        status: req.status,
    }))
}

/// Polling for who else is online doubles as the caller's own heartbeat.
async fn get_active_users(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ActiveUsersResponse>, AppError> {
    let username = require_user(&session).await?;
    state.repo.heartbeat(&username, None).await?;
    let users = state
        .repo
        .list_active(Utc::now(), state.presence_window)
        .await?;
    Ok(Json(ActiveUsersResponse { users }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update_status", post(update_status))
        .route("/get_active_users", get(get_active_users))
}
