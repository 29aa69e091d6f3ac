//! Test Fixtures
//!
//! Provides shared helpers for creating test databases, users, an
//! application backed by an in-memory design store, and requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::core::security::hash_password;
use crate::core::store::MemoryStore;
use crate::database::{Database, NewUser, UserOps, UserRecord, UserRole};

pub const TEST_PASSWORD: &str = "hunter2-but-longer";

pub const TEST_BASE_PATH: &str = "src/configs";

// =============================================================================
// Database Fixtures
// =============================================================================

/// Create a test database in a temporary directory.
/// Returns both the database and the TempDir (which must be kept alive).
pub async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::new(temp_dir.path())
        .await
        .expect("Failed to create test database");
    (db, temp_dir)
}

/// Insert an active user with [`TEST_PASSWORD`].
pub async fn create_test_user(db: &Database, username: &str, role: UserRole) -> UserRecord {
    db.create_user(&NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        hashed_password: hash_password(TEST_PASSWORD).expect("Failed to hash password"),
        role,
        is_active: true,
    })
    .await
    .expect("Failed to create user")
}

// =============================================================================
// Application Fixtures
// =============================================================================

/// Application state over a temp database and a memory store.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    _temp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let (db, temp) = create_test_db().await;
        let store = Arc::new(MemoryStore::new(TEST_BASE_PATH));
        let state = AppState::new(db, store.clone(), AppConfig::default());
        Self {
            state,
            store,
            _temp: temp,
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Create a user and return it with a bearer token.
    pub async fn user(&self, username: &str, role: UserRole) -> (UserRecord, String) {
        let user = create_test_user(self.db(), username, role).await;
        let token = self
            .state
            .tokens
            .create_access_token(&user.username, &user.role)
            .expect("Failed to issue token");
        (user, token)
    }

    /// Send one request through the full application.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = api::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(json_request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(json_request(Method::DELETE, uri, token, None)).await
    }
}

// =============================================================================
// Request Builders
// =============================================================================

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Invalid request"),
        None => builder.body(Body::empty()).expect("Invalid request"),
    }
}

pub fn form_request(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("Invalid request")
}

/// Single-file multipart body under the field name `file`.
pub fn multipart_request(uri: &str, token: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "raveling-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("Invalid request")
}
