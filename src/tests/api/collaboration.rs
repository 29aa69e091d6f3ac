//! Collaboration API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::database::UserRole;
use crate::tests::common::TestApp;

#[tokio::test]
async fn test_missing_note_reads_as_placeholder() {
    let app = TestApp::new().await;
    let (user, token) = app.user("alice", UserRole::Designer).await;

    let (status, body) = app.get("/api/collaboration/notes/weapons", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 0);
    assert_eq!(body["designer_type"], "weapons");
    assert_eq!(body["content"], "");
    assert_eq!(body["created_by_id"], user.id);
    assert!(body["created_by_username"].is_null());
}

#[tokio::test]
async fn test_shared_note_editing() {
    let app = TestApp::new().await;
    let (_, alice) = app.user("alice", UserRole::Designer).await;
    let (_, bob) = app.user("bob", UserRole::Player).await;

    let (status, body) = app
        .post("/api/collaboration/notes/spells", Some(&alice), json!({"content": "mana costs?"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created_by_username"], "alice");

    let (_, body) = app
        .post("/api/collaboration/notes/spells", Some(&bob), json!({"content": "lower them"}))
        .await;
    assert_eq!(body["content"], "lower them");
    assert_eq!(body["created_by_username"], "alice");
    assert_eq!(body["updated_by_username"], "bob");

    let (_, body) = app.get("/api/collaboration/notes/spells", Some(&alice)).await;
    assert_eq!(body["content"], "lower them");
}

#[tokio::test]
async fn test_unknown_designer_type_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice", UserRole::Designer).await;

    let (status, body) = app
        .post("/api/collaboration/notes/dragons", Some(&token), json!({"content": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid designer_type: dragons. Must be one of"));
}

#[tokio::test]
async fn test_user_color() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice", UserRole::Designer).await;

    let (_, body) = app.get("/api/collaboration/user-color", Some(&token)).await;
    assert_eq!(body, json!({"user_color": null}));

    let (status, body) = app
        .put("/api/collaboration/user-color", Some(&token), json!({"user_color": " #4a90e2 "}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user_color": "#4a90e2"}));

    let (_, body) = app.get("/api/collaboration/user-color", Some(&token)).await;
    assert_eq!(body["user_color"], "#4a90e2");

    let (status, body) = app
        .put("/api/collaboration/user-color", Some(&token), json!({"user_color": "blue"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid color format. Must be a hex color (e.g., #4a90e2)"
    );
}
