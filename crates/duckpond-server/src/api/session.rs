use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use duckpond_core::presence::STATUS_ACTIVE;

use crate::api::{current_user, SESSION_USER_KEY};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub username: String,
}

/// Create a profile key for a new user. Credential storage belongs to the
/// external identity collaborator; the server only records the profile.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if req.username.is_empty() {
        return Err(AppError::Validation("username required".into()));
    }
    if !state.repo.register_user(&req.username).await? {
        return Err(AppError::Validation("username already taken".into()));
    }
    Ok(Json(SessionResponse {
        success: true,
        username: req.username,
    }))
}

/// Open a session for a registered user and record a first heartbeat.
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if !state.repo.user_exists(&req.username).await? {
        return Err(AppError::Auth);
    }
    session.insert(SESSION_USER_KEY, &req.username).await?;
    state
        .repo
        .heartbeat(&req.username, Some(STATUS_ACTIVE))
        .await?;
    Ok(Json(SessionResponse {
        success: true,
        username: req.username,
    }))
}

/// Mark the user offline and drop the session.
async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(username) = current_user(&session).await? {
        state.repo.mark_offline(&username).await?;
    }
    session.flush().await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
