mod admin;
mod chat;
mod collection;
mod health;
mod presence;
mod session;
mod tasks;

use axum::Router;
use tower_sessions::Session;

use crate::error::AppError;
use crate::AppState;

pub(crate) const SESSION_USER_KEY: &str = "username";
pub(crate) const SESSION_ADMIN_KEY: &str = "admin";

/// Username from the session, if any. Credential handling lives in the
/// session layer; handlers only ever see the resolved username.
pub(crate) async fn current_user(session: &Session) -> Result<Option<String>, AppError> {
    Ok(session.get::<String>(SESSION_USER_KEY).await?)
}

pub(crate) async fn require_user(session: &Session) -> Result<String, AppError> {
    current_user(session).await?.ok_or(AppError::Auth)
}

pub(crate) async fn require_admin(session: &Session) -> Result<(), AppError> {
    if session
        .get::<bool>(SESSION_ADMIN_KEY)
        .await?
        .unwrap_or(false)
    {
        Ok(())
    } else {
        Err(AppError::Auth)
    }
}

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(collection::router())
        .merge(presence::router())
        .merge(chat::router())
        .merge(tasks::router())
        .merge(admin::router())
}
