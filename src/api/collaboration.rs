//! Shared designer notes and per-user highlight colors

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::extract::AuthUser;
use super::AppState;
use crate::database::{NoteOps, NoteRecord, UserOps, DESIGNER_TYPES};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes/:designer_type", get(get_note).post(upsert_note))
        .route("/user-color", get(get_user_color).put(update_user_color))
}

#[derive(Debug, Deserialize)]
pub struct NoteContent {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserColor {
    pub user_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserColorUpdate {
    pub user_color: String,
}

/// `#rrggbb` after trimming, or the message to report.
pub fn parse_hex_color(raw: &str) -> Result<&str, &'static str> {
    let color = raw.trim();
    if !color.starts_with('#') || color.len() != 7 {
        return Err("Invalid color format. Must be a hex color (e.g., #4a90e2)");
    }
    if !color[1..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Invalid hex color value");
    }
    Ok(color)
}

async fn get_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(designer_type): Path<String>,
) -> ApiResult<Json<NoteRecord>> {
    let note = state.db.get_note(&designer_type).await?;
    Ok(Json(note.unwrap_or_else(|| NoteRecord {
        id: 0,
        designer_type,
        content: String::new(),
        created_by_id: Some(user.id),
        updated_by_id: Some(user.id),
        created_at: String::new(),
        updated_at: None,
        created_by_username: None,
        updated_by_username: None,
    })))
}

async fn upsert_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(designer_type): Path<String>,
    Json(body): Json<NoteContent>,
) -> ApiResult<Json<NoteRecord>> {
    if !DESIGNER_TYPES.contains(&designer_type.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Invalid designer_type: {designer_type}. Must be one of {DESIGNER_TYPES:?}"
        )));
    }

    let note = state.db.upsert_note(&designer_type, &body.content, user.id).await?;
    tracing::debug!(designer_type = %designer_type, editor = %user.username, "Saved collaboration note");
    Ok(Json(note))
}

async fn get_user_color(user: AuthUser) -> Json<UserColor> {
    Json(UserColor {
        user_color: user.0.user_color,
    })
}

async fn update_user_color(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UserColorUpdate>,
) -> ApiResult<Json<UserColor>> {
    let color = parse_hex_color(&body.user_color).map_err(ApiError::bad_request)?;
    state.db.set_user_color(user.id, color).await?;
    Ok(Json(UserColor {
        user_color: Some(color.to_string()),
    }))
}
