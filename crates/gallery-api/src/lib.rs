pub mod auth;
pub mod error;
pub mod host;
pub mod images;
pub mod middleware;
pub mod users;
mod views;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tracing::error;

use gallery_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::images::MAX_UPLOAD_BODY;
use crate::middleware::require_auth;

/// Builds the `/api` router. Owner-only routes sit behind [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/images/all", get(images::list_all))
        .route("/api/images/user/{username}", get(images::list_by_username))
        .route("/api/users/{username}", get(users::get_profile))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/api/images/upload",
            post(images::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/api/images/my-images", get(images::list_mine))
        .route("/api/images/{id}", delete(images::delete_image))
        .route("/api/users/me/info", get(users::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs a blocking database call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::Error::from(e)
        })??;
    Ok(result)
}
