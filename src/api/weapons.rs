//! Weapon analysis, thumbnails and the weapon/spell quick-save store
//!
//! Quick-save documents go straight to the design store under the `weapon`
//! and `spell` kinds, without a metadata row.

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, DESIGNERS};
use super::AppState;
use crate::core::store::{sanitize_name, StorageError};
use crate::core::weapon_analysis::{expected_damage_per_strike, simulate_damage, DamageAnalysis, WeaponConfig};

/// Largest accepted thumbnail.
pub const MAX_THUMBNAIL_BYTES: usize = 2 * 1024 * 1024;

pub const THUMBNAIL_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// One quick-save kind: store kind, request/response field and the
/// placeholder name the designer uses before one is entered.
#[derive(Debug, Clone, Copy)]
pub struct QuickSave {
    pub kind: &'static str,
    pub field: &'static str,
    pub placeholder: &'static str,
}

pub const WEAPONS: QuickSave = QuickSave {
    kind: "weapon",
    field: "weapon_config",
    placeholder: "unnamed_weapon",
};

pub const SPELLS: QuickSave = QuickSave {
    kind: "spell",
    field: "spell_config",
    placeholder: "unnamed_spell",
};

fn quick_save_routes(quick: QuickSave) -> Router<AppState> {
    Router::new()
        .route("/save-config", post(save_config))
        .route("/list-configs", get(list_configs))
        .route("/load-config/:name", get(load_config))
        .layer(Extension(quick))
}

pub fn weapon_router() -> Router<AppState> {
    // Headroom over the thumbnail limit so oversize files get a 400 here
    // rather than a 413 from the extractor.
    let upload = post(upload_thumbnail).layer(DefaultBodyLimit::max(MAX_THUMBNAIL_BYTES * 2));

    quick_save_routes(WEAPONS)
        .route("/analyze-damage", post(analyze_damage))
        .route("/expected-damage", post(expected_damage))
        .route("/upload-thumbnail", upload)
}

pub fn spell_router() -> Router<AppState> {
    quick_save_routes(SPELLS)
}

fn default_strikes() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub weapon_config: WeaponConfig,
    #[serde(default = "default_strikes")]
    pub num_strikes: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedDamageRequest {
    pub weapon_config: WeaponConfig,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub item_name: String,
}

async fn analyze_damage(user: AuthUser, Json(request): Json<AnalyzeRequest>) -> ApiResult<Json<DamageAnalysis>> {
    user.require(DESIGNERS)?;

    let AnalyzeRequest { weapon_config, num_strikes } = request;
    let analysis = tokio::task::spawn_blocking(move || {
        simulate_damage(&weapon_config, num_strikes, &mut rand::thread_rng())
    })
    .await
    .map_err(|e| ApiError::internal(format!("Failed to analyze damage: {e}")))??;

    Ok(Json(analysis))
}

async fn expected_damage(user: AuthUser, Json(request): Json<ExpectedDamageRequest>) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;
    Ok(Json(json!({
        "expected_damage_per_strike": expected_damage_per_strike(&request.weapon_config),
    })))
}

async fn save_config(
    State(state): State<AppState>,
    Extension(quick): Extension<QuickSave>,
    user: AuthUser,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;

    let config = body
        .get(quick.field)
        .filter(|v| v.is_object())
        .ok_or_else(|| ApiError::bad_request(format!("{} must be an object", quick.field)))?;

    let name = config
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty() && *name != quick.placeholder)
        .ok_or_else(|| ApiError::bad_request(format!("{} name is required", title(quick.kind))))?;

    let message = format!("Save {} config: {name}", quick.kind);
    let commit_sha = state
        .store
        .save_config(quick.kind, name, config, Some(&message))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save {} config to GitHub: {e}", quick.kind)))?;

    Ok(Json(json!({
        "commit_sha": commit_sha,
        "file_path": state.store.file_path(quick.kind, name),
    })))
}

async fn list_configs(
    State(state): State<AppState>,
    Extension(quick): Extension<QuickSave>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;
    let configs = state
        .store
        .list_configs(quick.kind)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list {} configs: {e}", quick.kind)))?;
    Ok(Json(json!({ "configs": configs })))
}

async fn load_config(
    State(state): State<AppState>,
    Extension(quick): Extension<QuickSave>,
    user: AuthUser,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;
    let config = state
        .store
        .load_config(quick.kind, &name)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => {
                ApiError::not_found(format!("{} config '{name}' not found", title(quick.kind)))
            }
            other => ApiError::internal(format!("Failed to load {} config: {other}", quick.kind)),
        })?;

    let mut body = Map::new();
    body.insert(quick.field.to_string(), config);
    Ok(Json(Value::Object(body)))
}

/// Matching allowed extension, compared case-insensitively.
pub fn thumbnail_extension(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_ascii_lowercase();
    THUMBNAIL_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| lower.ends_with(ext))
}

/// Repository path for an item's thumbnail.
pub fn thumbnail_path(item_name: &str, extension: &str) -> String {
    let safe = sanitize_name(item_name);
    let safe = if safe.is_empty() { "item".to_string() } else { safe };
    format!("thumbnails/items/{safe}{extension}")
}

async fn upload_thumbnail(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ThumbnailQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
            upload = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    let extension = thumbnail_extension(&file_name).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid file type. Allowed: {}",
            THUMBNAIL_EXTENSIONS.join(", ")
        ))
    })?;

    if bytes.len() > MAX_THUMBNAIL_BYTES {
        return Err(ApiError::bad_request("File size exceeds 2MB limit"));
    }

    let path = thumbnail_path(&query.item_name, extension);
    let message = format!("Upload thumbnail for item: {}", query.item_name);
    let commit_sha = state
        .store
        .save_file(&path, &bytes, Some(&message))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to upload thumbnail to GitHub: {e}")))?;

    tracing::info!(path = %path, size = bytes.len(), "Uploaded thumbnail");
    Ok(Json(json!({
        "thumbnail_path": path,
        "commit_sha": commit_sha,
    })))
}

fn title(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
