//! Registration, login and the one-time admin bootstrap

use std::sync::OnceLock;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::extract::AuthUser;
use super::AppState;
use crate::core::security::{hash_password, verify_password};
use crate::database::{Database, NewUser, UserOps, UserRecord, UserRole};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/create-admin", post(create_admin))
}

fn default_role() -> UserRole {
    UserRole::Player
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

/// OAuth2 password grant form. Extra grant fields are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminQuery {
    pub username: String,
    pub email: String,
    pub password: String,
    pub secret_token: String,
}

/// Loose address shape check: one `@` and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(email))
}

/// Uniqueness and format checks shared by every account-creating path.
pub(crate) async fn check_new_account(
    db: &Database,
    username: &str,
    email: &str,
    taken: &str,
) -> ApiResult<()> {
    if db.get_user_by_username(username).await?.is_some() {
        return Err(ApiError::bad_request(format!("Username already {taken}")));
    }
    if db.get_user_by_email(email).await?.is_some() {
        return Err(ApiError::bad_request(format!("Email already {taken}")));
    }
    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    check_new_account(&state.db, &request.username, &request.email, "registered").await?;

    if !request.role.is_self_service() {
        return Err(ApiError::Forbidden(
            "Only PLAYER and VIEWER roles can be self-assigned. Contact an admin for elevated roles."
                .to_string(),
        ));
    }

    let user = state
        .db
        .create_user(&NewUser {
            username: request.username,
            email: request.email,
            hashed_password: hash_password(&request.password)?,
            role: request.role,
            is_active: true,
        })
        .await?;

    tracing::info!(username = %user.username, role = %user.role, "Registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .db
        .get_user_by_username(&form.username)
        .await?
        .filter(|user| verify_password(&form.password, &user.hashed_password))
        .ok_or_else(|| ApiError::Unauthorized("Incorrect username or password".to_string()))?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    let access_token = state.tokens.create_access_token(&user.username, &user.role)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn me(user: AuthUser) -> Json<UserRecord> {
    Json(user.0)
}

/// Tokens are stateless; the client discards its copy.
async fn logout() -> Json<Value> {
    Json(json!({ "message": "Successfully logged out" }))
}

async fn create_admin(
    State(state): State<AppState>,
    Query(query): Query<CreateAdminQuery>,
) -> ApiResult<Json<Value>> {
    let expected = &state.config.auth.secret_key;
    if expected.is_empty() || query.secret_token != *expected {
        return Err(ApiError::Forbidden("Invalid secret token".to_string()));
    }

    if state.db.count_users_with_role(UserRole::Admin).await? > 0 {
        return Err(ApiError::bad_request(
            "An admin user already exists. Use the admin panel to create additional admins.",
        ));
    }

    check_new_account(&state.db, &query.username, &query.email, "exists").await?;

    let admin = state
        .db
        .create_user(&NewUser {
            username: query.username,
            email: query.email,
            hashed_password: hash_password(&query.password)?,
            role: UserRole::Admin,
            is_active: true,
        })
        .await?;

    tracing::info!(username = %admin.username, "Bootstrapped admin user");
    Ok(Json(json!({
        "message": "Admin user created successfully",
        "username": admin.username,
        "email": admin.email,
        "role": admin.role,
    })))
}
