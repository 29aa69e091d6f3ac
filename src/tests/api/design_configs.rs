//! Design Config API Tests
//!
//! CRUD for items, skills and characters, with content in the memory store.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::core::store::ConfigStore;
use crate::database::UserRole;
use crate::tests::common::TestApp;

async fn create_item(app: &TestApp, token: &str, name: &str, content: Value) -> Value {
    let (status, body) = app
        .post(
            "/api/items",
            Some(token),
            json!({"name": name, "content": content, "description": "desc", "tags": "melee"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

#[tokio::test]
async fn test_create_item_writes_store_and_row() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;

    let body = create_item(&app, &token, "Iron Sword", json!({"damage": 7})).await;

    assert_eq!(body["name"], "Iron Sword");
    assert_eq!(body["config_type"], "item");
    assert_eq!(body["github_path"], "src/configs/items/IronSword.yaml");
    assert_eq!(body["is_approved"], false);
    assert_eq!(body["content"], json!({"damage": 7}));

    let stored = app.store.load_config("item", "Iron Sword").await.unwrap();
    assert_eq!(stored, json!({"damage": 7}));
    assert_eq!(app.store.commits().await[0].message, "Create item: Iron Sword");
}

#[tokio::test]
async fn test_create_requires_designer_and_unique_name() {
    let app = TestApp::new().await;
    let (_, player) = app.user("player", UserRole::Player).await;
    let (_, designer) = app.user("designer", UserRole::Designer).await;

    let (status, _) = app
        .post("/api/skills", Some(&player), json!({"name": "Dash", "content": {}}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/api/skills", Some(&designer), json!({"name": "Dash", "content": {}}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/skills", Some(&designer), json!({"name": "Dash", "content": {}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Skill with this name already exists");
}

#[tokio::test]
async fn test_configs_are_private_to_owner() {
    let app = TestApp::new().await;
    let (_, alice) = app.user("alice", UserRole::Designer).await;
    let (_, bob) = app.user("bob", UserRole::Designer).await;

    let created = create_item(&app, &alice, "Axe", json!({"damage": 5})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.get("/api/items", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/items", Some(&bob)).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app.get(&format!("/api/items/{id}"), Some(&bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item not found");

    // Kinds are separate namespaces.
    let (status, body) = app.get(&format!("/api/characters/{id}"), Some(&alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Character not found");
}

#[tokio::test]
async fn test_get_and_list_with_missing_document() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;

    let kept = create_item(&app, &token, "Kept", json!({"v": 1})).await;
    let lost = create_item(&app, &token, "Lost", json!({"v": 2})).await;
    app.store.delete_config("item", "Lost").await.unwrap();

    let (status, body) = app.get(&format!("/api/items/{}", kept["id"]), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!({"v": 1}));

    let (status, body) = app.get(&format!("/api/items/{}", lost["id"]), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item config file not found in GitHub");

    let (_, body) = app.get("/api/items", Some(&token)).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Kept"]);
}

#[tokio::test]
async fn test_update_content_and_metadata() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let created = create_item(&app, &token, "Bow", json!({"range": 10})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .put(
            &format!("/api/items/{id}"),
            Some(&token),
            json!({"content": {"range": 20}, "description": "longer"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bow");
    assert_eq!(body["description"], "longer");
    assert_eq!(body["tags"], "melee");
    assert_eq!(body["content"], json!({"range": 20}));
    assert_eq!(app.store.load_config("item", "Bow").await.unwrap(), json!({"range": 20}));
}

#[tokio::test]
async fn test_rename_without_content_moves_document() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let created = create_item(&app, &token, "Old Blade", json!({"edge": "sharp"})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .put(&format!("/api/items/{id}"), Some(&token), json!({"name": "New Blade"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "New Blade");
    assert_eq!(body["github_path"], "src/configs/items/NewBlade.yaml");
    assert_eq!(body["content"], json!({"edge": "sharp"}));

    assert_eq!(
        app.store.load_config("item", "New Blade").await.unwrap(),
        json!({"edge": "sharp"})
    );
    assert!(app
        .store
        .load_config("item", "Old Blade")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_rename_to_same_sanitized_path_keeps_document() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let created = create_item(&app, &token, "Hammer", json!({"weight": 9})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .put(&format!("/api/items/{id}"), Some(&token), json!({"name": "Ham mer"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ham mer");
    assert_eq!(body["content"], json!({"weight": 9}));
}

#[tokio::test]
async fn test_rename_onto_existing_name_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let axe = create_item(&app, &token, "Axe", json!({"who": "axe"})).await;
    create_item(&app, &token, "Bow", json!({"who": "bow"})).await;
    let id = axe["id"].as_i64().unwrap();

    let (status, body) = app
        .put(&format!("/api/items/{id}"), Some(&token), json!({"name": "Bow"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Item with this name already exists");

    assert_eq!(app.store.load_config("item", "Bow").await.unwrap(), json!({"who": "bow"}));
    assert_eq!(app.store.load_config("item", "Axe").await.unwrap(), json!({"who": "axe"}));
    let (_, axe) = app.get(&format!("/api/items/{id}"), Some(&token)).await;
    assert_eq!(axe["name"], "Axe");
}

#[tokio::test]
async fn test_empty_name_is_not_a_rename() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let created = create_item(&app, &token, "Staff", json!({})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .put(&format!("/api/items/{id}"), Some(&token), json!({"name": "", "tags": "magic"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Staff");
    assert_eq!(body["tags"], "magic");
}

#[tokio::test]
async fn test_delete_config_tolerates_missing_document() {
    let app = TestApp::new().await;
    let (_, token) = app.user("designer", UserRole::Designer).await;
    let first = create_item(&app, &token, "One", json!({})).await;
    let second = create_item(&app, &token, "Two", json!({})).await;
    app.store.delete_config("item", "Two").await.unwrap();

    let (status, _) = app.delete(&format!("/api/items/{}", first["id"]), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.store.load_config("item", "One").await.is_err());

    let (status, _) = app.delete(&format!("/api/items/{}", second["id"]), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/items", Some(&token)).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.delete(&format!("/api/items/{}", first["id"]), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
