//! Account administration (admin only)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::auth::{check_new_account, is_valid_email};
use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, ADMINS};
use super::{AppState, Pagination};
use crate::core::security::hash_password;
use crate::database::{NewUser, UserOps, UserRecord, UserRole, UserUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).put(update_user).delete(delete_user))
}

fn default_role() -> UserRole {
    UserRole::Player
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AdminUserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<UserRecord>>> {
    user.require(ADMINS)?;
    Ok(Json(state.db.list_users(page.skip, page.limit).await?))
}

async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserRecord>> {
    user.require(ADMINS)?;
    let record = state.db.get_user(user_id).await?.ok_or_else(user_not_found)?;
    Ok(Json(record))
}

async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AdminUserCreate>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    user.require(ADMINS)?;
    check_new_account(&state.db, &request.username, &request.email, "registered").await?;

    let created = state
        .db
        .create_user(&NewUser {
            username: request.username,
            email: request.email,
            hashed_password: hash_password(&request.password)?,
            role: request.role,
            is_active: request.is_active,
        })
        .await?;

    tracing::info!(admin = %user.username, username = %created.username, role = %created.role, "Created user");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserRecord>> {
    user.require(ADMINS)?;
    state.db.get_user(user_id).await?.ok_or_else(user_not_found)?;

    if user_id == user.id {
        if update.is_active == Some(false) {
            return Err(ApiError::bad_request("Cannot deactivate your own account"));
        }
        if update.role.is_some() {
            return Err(ApiError::bad_request("Cannot change your own role"));
        }
    }

    if let Some(email) = &update.email {
        if !is_valid_email(email) {
            return Err(ApiError::bad_request("Invalid email address"));
        }
        if let Some(other) = state.db.get_user_by_email(email).await? {
            if other.id != user_id {
                return Err(ApiError::bad_request("Email already registered"));
            }
        }
    }

    let updated = state
        .db
        .update_user(user_id, &update)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(updated))
}

async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.require(ADMINS)?;
    state.db.get_user(user_id).await?.ok_or_else(user_not_found)?;

    if user_id == user.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    state.db.delete_user(user_id).await?;
    tracing::info!(admin = %user.username, user_id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
