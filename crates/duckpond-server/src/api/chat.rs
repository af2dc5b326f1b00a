use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use duckpond_core::chat::ChatMessage;

use crate::api::{current_user, require_user};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}

async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = require_user(&session).await?;
    if req.message.is_empty() {
        return Err(AppError::Validation("message required".into()));
    }
    state.repo.push_message(&username, &req.message).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Unauthenticated reads degrade to an empty feed rather than failing.
async fn get_messages(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = match current_user(&session).await? {
        Some(_) => state.repo.load_feed().await?.messages,
        None => Vec::new(),
    };
    Ok(Json(MessagesResponse { messages }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send_message", post(send_message))
        .route("/get_messages", get(get_messages))
}
