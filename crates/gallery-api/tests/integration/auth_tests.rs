//! Registration, login and bearer-token tests.

use axum::http::StatusCode;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

use gallery_types::api::Claims;

use super::test_utils::{TEST_SECRET, TestApp};

// =============================================================================
// Register
// =============================================================================

#[tokio::test]
async fn test_register_returns_token_and_public_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({ "username": "alice", "email": "alice@example.com", "password": "pw-alice" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_duplicate_email_fails() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({ "username": "alice2", "email": "alice@example.com", "password": "pw" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn test_register_duplicate_username_fails() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({ "username": "alice", "email": "someone@example.com", "password": "pw" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new();

    for body in [
        json!({ "email": "a@example.com", "password": "pw" }),
        json!({ "username": "a", "password": "pw" }),
        json!({ "username": "a", "email": "a@example.com" }),
        json!({ "username": "", "email": "a@example.com", "password": "pw" }),
    ] {
        let (status, resp) = app.post_json("/api/auth/register", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "All fields are required");
    }
}

#[tokio::test]
async fn test_malformed_json_gets_message_body() {
    let app = TestApp::new();

    let mut req = super::test_utils::request(
        axum::http::Method::POST,
        "/api/auth/register",
        None,
        axum::body::Body::from("{not json"),
    );
    req.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        "application/json".parse().unwrap(),
    );

    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    let (_, user_id) = app.register("alice").await;

    let (status, body) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "correct horse battery staple" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], user_id.as_str());

    let token = body["token"].as_str().unwrap();
    let (status, me) = app.get("/api/users/me/info", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn test_login_failure_is_uniform() {
    let app = TestApp::new();
    app.register("alice").await;

    let unknown = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": "whatever" }),
        )
        .await;
    let wrong_password = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "wrong" }),
        )
        .await;

    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong_password);
    assert_eq!(unknown.1, json!({ "message": "Invalid credentials" }));
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/auth/login", json!({ "email": "alice@example.com" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");
}

// =============================================================================
// Bearer tokens
// =============================================================================

#[tokio::test]
async fn test_registration_token_authenticates_owner_routes() {
    let app = TestApp::new();
    let (token, _) = app.register("alice").await;

    let (status, body) = app.get("/api/images/my-images", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/images/my-images", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token, authorization denied");
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = TestApp::new();
    let (token, _) = app.register("alice").await;

    // Flip one character of the signature.
    let mut tampered = token.into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let (status, body) = app.get("/api/images/my-images", Some(&tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new();
    let (_, user_id) = app.register("alice").await;

    let claims = Claims {
        sub: user_id.parse::<Uuid>().unwrap(),
        username: "alice".into(),
        exp: (chrono::Utc::now() - chrono::Duration::days(8)).timestamp() as usize,
    };
    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = app.get("/api/images/my-images", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");
}
