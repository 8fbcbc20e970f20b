use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use gallery_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{run_db, views};

/// GET /api/users/{username} — public profile, never includes email or hash.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(views::public_user(user)?))
}

/// GET /api/users/me/info — the caller's own account.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let user = run_db(&state, move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(views::account_info(user)?))
}
