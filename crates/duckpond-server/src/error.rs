use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application error type.
///
/// Missing-index deletes and missing-user reads are deliberately not here:
/// they degrade to no-ops or empty defaults so harmless races never surface
/// as user-visible failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authenticated")]
    Auth,

    #[error("{0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<duckpond_core::DomainError> for AppError {
    fn from(err: duckpond_core::DomainError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth => (StatusCode::UNAUTHORIZED, "Not authenticated".to_owned()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(e) => {
                tracing::error!("store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
            }
            AppError::Session(e) => {
                tracing::error!("session error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
            }
            AppError::Serialization(e) => {
                tracing::error!("serialization error: {:?}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON".to_owned())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}
