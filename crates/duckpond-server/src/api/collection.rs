use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;

use duckpond_core::collection::{Collection, Duck, DEFAULT_COLOR};

use crate::api::{current_user, require_user};
use crate::error::AppError;
use crate::AppState;

/// A full client snapshot. Map keys arrive as JSON object keys (strings);
/// malformed or out-of-range entries are dropped, not rejected.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub items: BTreeMap<String, DuckPayload>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct DuckPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_owned()
}

/// The only client write path: every push is a full overwrite of the
/// authoritative collection.
async fn sync_collection(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SyncRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = require_user(&session).await?;
    if req.count < 0 {
        return Err(AppError::Validation("count must be non-negative".into()));
    }

    let items = req
        .items
        .into_iter()
        .map(|(key, duck)| {
            (
                key,
                Duck {
                    name: duck.name,
                    color: duck.color,
                },
            )
        })
        .collect();
    let count = u32::try_from(req.count).unwrap_or(u32::MAX);
    let collection = Collection::from_snapshot(count, items, req.annotations);
    state.repo.save_collection(&username, &collection).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Read back the authoritative snapshot. Never fails for an unknown or
/// unauthenticated caller; it degrades to the empty snapshot.
async fn get_collection(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Collection>, AppError> {
    let collection = match current_user(&session).await? {
        Some(username) => state.repo.load_collection(&username).await?,
        None => Collection::default(),
    };
    Ok(Json(collection))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync_collection", post(sync_collection))
        .route("/get_collection", get(get_collection))
}
