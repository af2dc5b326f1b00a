use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use duckpond_core::chat::{ChatFeed, ChatMessage, SYSTEM_AUTHOR};
use duckpond_core::collection::Duck;

use crate::api::{require_admin, SESSION_ADMIN_KEY};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DuckRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Cross-user summary mirroring what the admin dashboard renders.
#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub per_user: BTreeMap<String, UserSummary>,
    pub messages: Vec<ChatMessage>,
    pub stats: SummaryStats,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub count: u32,
    pub items: BTreeMap<u32, Duck>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_users: usize,
    pub total_ducks: u64,
    pub total_messages: usize,
    pub active_users: usize,
}

async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.username != state.admin_username || req.password != state.admin_password {
        return Err(AppError::Auth);
    }
    session.insert(SESSION_ADMIN_KEY, true).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn admin_logout(session: Session) -> Result<Json<serde_json::Value>, AppError> {
    session.remove::<bool>(SESSION_ADMIN_KEY).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Full-state dump: per-user collections, the chat feed and the aggregate
/// counters. Users without a collection record contribute empty defaults.
async fn get_data(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AdminSummary>, AppError> {
    require_admin(&session).await?;

    let mut per_user = BTreeMap::new();
    let mut total_ducks = 0u64;
    for username in state.repo.list_users().await? {
        let collection = state.repo.load_collection(&username).await?;
        total_ducks += u64::from(collection.count);
        per_user.insert(
            username,
            UserSummary {
                count: collection.count,
                items: collection.items,
            },
        );
    }

    let messages = state.repo.load_feed().await?.messages;
    let active = state
        .repo
        .list_active(Utc::now(), state.presence_window)
        .await?;

    let stats = SummaryStats {
        total_users: per_user.len(),
        total_ducks,
        total_messages: messages.len(),
        active_users: active.len(),
    };

    Ok(Json(AdminSummary {
        per_user,
        messages,
        stats,
    }))
}

async fn add_duck(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
    Json(req): Json<DuckRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    let index = state.repo.add_duck(&username, &req.name, &req.color).await?;
    Ok(Json(serde_json::json!({ "success": true, "index": index })))
}

/// Removing a missing index is a silent no-op so double-deletes from
/// concurrent admin actions never fail.
async fn remove_duck(
    State(state): State<AppState>,
    session: Session,
    Path((username, index)): Path<(String, u32)>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    state.repo.remove_duck(&username, index).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn clear_ducks(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    state.repo.clear_ducks(&username).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    state.repo.delete_user(&username).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// One duck for everyone. Reports how many users were affected; one user's
/// failure does not abort the rest.
async fn mass_add_ducks(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<DuckRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    let users = state.repo.list_users().await?;
    let affected = state.repo.bulk_add(&users, &req.name, &req.color).await;
    Ok(Json(serde_json::json!({
        "success": true,
        "users_affected": affected
    })))
}

async fn clear_chat(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    state.repo.clear_feed().await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Clear the chat and post a system banner opening the new workday.
async fn start_workday(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&session).await?;
    let now = Utc::now();
    let mut feed = ChatFeed::default();
    feed.push(
        SYSTEM_AUTHOR,
        &format!("A new workday has started! ({})", now.format("%d.%m.%Y")),
        now,
    );
    state.repo.save_feed(&feed).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(admin_login))
        .route("/admin/logout", post(admin_logout))
        .route("/admin/get_data", get(get_data))
        .route("/admin/users/{username}/ducks", post(add_duck))
        .route("/admin/users/{username}/ducks/{index}", delete(remove_duck))
        .route("/admin/users/{username}/clear_ducks", post(clear_ducks))
        .route("/admin/users/{username}", delete(delete_user))
        .route("/admin/mass_add_ducks", post(mass_add_ducks))
        .route("/admin/clear_chat", post(clear_chat))
        .route("/admin/start_workday", post(start_workday))
}
