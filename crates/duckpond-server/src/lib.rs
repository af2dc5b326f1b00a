pub mod api;
pub mod config;
pub mod error;
pub mod repo;
pub mod store;

use std::sync::Arc;

use axum::Router;
use chrono::TimeDelta;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::repo::Repository;
use crate::store::PgStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub admin_username: String,
    pub admin_password: String,
    pub presence_window: TimeDelta,
}

/// Build the full application router, including the session layer.
pub fn app(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(session_layer)
        .with_state(state)
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    // Initialize the key-value store
    let store = PgStore::connect(&config.database_url).await?;

    // Run migrations
    store.migrate().await?;

    // Create application state
    let state = AppState {
        repo: Repository::new(Arc::new(store)),
        admin_username: config.admin_username,
        admin_password: config.admin_password,
        presence_window: TimeDelta::seconds(config.presence_window_secs),
    };

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
