use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use gallery_db::models::UserRow;
use gallery_db::{Database, is_unique_violation, timestamp_now};
use gallery_types::api::{AuthResponse, AuthUser, Claims, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::host::ImageHost;
use crate::run_db;

/// Tokens stay valid for a week.
pub const TOKEN_TTL_DAYS: i64 = 7;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub host: Arc<dyn ImageHost>,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(email), Some(password)) =
        (present(req.username), present(req.email), present(req.password))
    else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    ensure_available(&state, &email, &username).await?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let row = UserRow {
        id: user_id.to_string(),
        username: username.clone(),
        email: email.clone(),
        password: password_hash,
        created_at: timestamp_now(),
    };

    let inserted = run_db(&state, move |db| match db.create_user(&row) {
        Ok(()) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    })
    .await?;

    if !inserted {
        // Lost a race with a concurrent registration; report which field clashed.
        ensure_available(&state, &email, &username).await?;
        return Err(ApiError::bad_request("Username already exists"));
    }

    let token = create_token(&state.jwt_secret, user_id, &username)?;
    info!("Registered user {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            token,
            user: AuthUser {
                id: user_id,
                username,
                email,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user = run_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id = user.id.parse::<Uuid>().map_err(anyhow::Error::from)?;
    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: AuthUser {
            id: user_id,
            username: user.username,
            email: user.email,
        },
    }))
}

/// Rejects the registration if the email or username is already taken.
async fn ensure_available(state: &AppState, email: &str, username: &str) -> Result<(), ApiError> {
    let (e, u) = (email.to_string(), username.to_string());
    let existing = run_db(state, move |db| db.find_conflicting_user(&e, &u)).await?;

    match existing {
        Some(user) if user.email == email => Err(ApiError::bad_request("Email already exists")),
        Some(_) => Err(ApiError::bad_request("Username already exists")),
        None => Ok(()),
    }
}

/// Missing and empty fields are treated alike.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
