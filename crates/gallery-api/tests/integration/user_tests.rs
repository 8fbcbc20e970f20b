//! Profile lookup tests.

use axum::http::StatusCode;

use super::test_utils::TestApp;

#[tokio::test]
async fn test_public_profile_hides_private_fields() {
    let app = TestApp::new();
    let (_, user_id) = app.register("alice").await;

    let (status, body) = app.get("/api/users/alice", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], user_id.as_str());
    assert_eq!(body["username"], "alice");
    assert!(body["createdAt"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("email").is_none());
}

#[tokio::test]
async fn test_unknown_profile_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_me_info_includes_email_but_not_password() {
    let app = TestApp::new();
    let (token, _) = app.register("alice").await;

    let (status, body) = app.get("/api/users/me/info", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_me_info_requires_token() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/users/me/info", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
