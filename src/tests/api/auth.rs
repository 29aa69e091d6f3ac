//! Authentication API Tests
//!
//! Registration, login, token resolution and the admin bootstrap.

use axum::http::StatusCode;
use serde_json::json;

use crate::database::{UserOps, UserRole, UserUpdate};
use crate::tests::common::{form_request, TestApp, TEST_PASSWORD};

const BOOTSTRAP_SECRET: &str = "change-this-secret-key-in-production";

// =============================================================================
// Service Routes
// =============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Raveling MUD API");
    assert_eq!(body["version"], crate::VERSION);

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_defaults_to_player() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "newbie", "email": "newbie@example.com", "password": "pw123456"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "newbie");
    assert_eq!(body["role"], "player");
    assert_eq!(body["is_active"], true);
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_register_rejects_elevated_roles() {
    let app = TestApp::new().await;

    for role in ["designer", "admin"] {
        let (status, body) = app
            .post(
                "/api/auth/register",
                None,
                json!({"username": role, "email": format!("{role}@example.com"), "password": "pw", "role": role}),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["detail"].as_str().unwrap().starts_with("Only PLAYER and VIEWER"));
    }

    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "watcher", "email": "watcher@example.com", "password": "pw", "role": "viewer"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_uniqueness_and_email_format() {
    let app = TestApp::new().await;
    app.user("taken", UserRole::Player).await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "taken", "email": "fresh@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already registered");

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "fresh", "email": "taken@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "fresh", "email": "not-an-email", "password": "pw"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid email address");
}

// =============================================================================
// Login and Token Resolution
// =============================================================================

#[tokio::test]
async fn test_login_issues_usable_token() {
    let app = TestApp::new().await;
    app.user("alice", UserRole::Designer).await;

    let (status, body) = app
        .send(form_request(
            "/api/auth/login",
            &format!("username=alice&password={TEST_PASSWORD}&grant_type=password"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "designer");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.user("alice", UserRole::Player).await;

    for form in ["username=alice&password=wrong", "username=nobody&password=wrong"] {
        let (status, body) = app.send(form_request("/api/auth/login", form)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Incorrect username or password");
    }
}

#[tokio::test]
async fn test_inactive_user_is_rejected() {
    let app = TestApp::new().await;
    let (user, token) = app.user("sleeper", UserRole::Player).await;
    app.db()
        .update_user(
            user.id,
            &UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, body) = app
        .send(form_request(
            "/api/auth/login",
            &format!("username=sleeper&password={TEST_PASSWORD}"),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Inactive user");

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Inactive user");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Not authenticated");

    let (status, body) = app.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");

    let expired = app
        .state
        .tokens
        .create_token_with_expiry("alice", "player", chrono::Duration::seconds(-30))
        .unwrap();
    let (status, _) = app.get("/api/auth/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but the user does not exist.
    let ghost = app.state.tokens.create_access_token("ghost", "admin").unwrap();
    let (status, _) = app.get("/api/auth/me", Some(&ghost)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthorized_carries_bearer_challenge() {
    let app = TestApp::new().await;
    let response = tower::ServiceExt::oneshot(
        crate::api::app(app.state.clone()),
        crate::tests::common::json_request(axum::http::Method::GET, "/api/auth/me", None, None),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_logout() {
    let app = TestApp::new().await;
    let (_, body) = app.post("/api/auth/logout", None, json!({})).await;
    assert_eq!(body["message"], "Successfully logged out");
}

// =============================================================================
// Admin Bootstrap
// =============================================================================

fn bootstrap_uri(username: &str, secret: &str) -> String {
    format!(
        "/api/auth/create-admin?username={username}&email={username}@example.com&password=pw123456&secret_token={secret}"
    )
}

#[tokio::test]
async fn test_create_admin_once() {
    let app = TestApp::new().await;

    let (status, body) = app.post(&bootstrap_uri("root", "wrong"), None, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid secret token");

    let (status, body) = app
        .post(&bootstrap_uri("root", BOOTSTRAP_SECRET), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "root");
    assert_eq!(body["role"], "admin");

    let (status, body) = app
        .post(&bootstrap_uri("second", BOOTSTRAP_SECRET), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("An admin user already exists"));
}

#[tokio::test]
async fn test_create_admin_rejects_taken_username() {
    let app = TestApp::new().await;
    app.user("root", UserRole::Player).await;

    let (status, body) = app
        .post(&bootstrap_uri("root", BOOTSTRAP_SECRET), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already exists");
}
