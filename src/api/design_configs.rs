//! Design config CRUD for items, skills and characters
//!
//! Content lives in the design store; the database keeps the metadata row.
//! Every lookup is scoped to the calling user as owner. One router is built
//! per [`ConfigType`] and the type reaches handlers as an extension.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, DESIGNERS};
use super::{AppState, Pagination};
use crate::core::store::StorageError;
use crate::database::{ConfigType, DesignConfigOps, DesignConfigRecord, NewDesignConfig};

pub fn router(config_type: ConfigType) -> Router<AppState> {
    Router::new()
        .route("/", get(list_configs).post(create_config))
        .route("/:config_id", get(get_config).put(update_config).delete(delete_config))
        .layer(Extension(config_type))
}

#[derive(Debug, Deserialize)]
pub struct ConfigCreate {
    pub name: String,
    pub content: Map<String, Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<Map<String, Value>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Metadata row plus the document loaded from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub id: i64,
    pub name: String,
    pub config_type: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub github_path: Option<String>,
    pub is_approved: bool,
    pub approved_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub content: Value,
}

impl ConfigResponse {
    fn new(record: DesignConfigRecord, content: Value) -> Self {
        Self {
            id: record.id,
            name: record.name,
            config_type: record.config_type,
            description: record.description,
            tags: record.tags,
            github_path: record.github_path,
            is_approved: record.is_approved,
            approved_at: record.approved_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            content,
        }
    }
}

fn not_found(config_type: ConfigType) -> ApiError {
    ApiError::not_found(format!("{} not found", config_type.title()))
}

async fn owned(state: &AppState, config_type: ConfigType, id: i64, user: &AuthUser) -> ApiResult<DesignConfigRecord> {
    state
        .db
        .get_owned_config(id, config_type, user.id)
        .await?
        .ok_or_else(|| not_found(config_type))
}

async fn list_configs(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ConfigResponse>>> {
    let records = state
        .db
        .list_owned_configs(config_type, user.id, page.skip, page.limit)
        .await?;

    let mut configs = Vec::with_capacity(records.len());
    for record in records {
        match state.store.load_config(config_type.as_str(), &record.name).await {
            Ok(content) => configs.push(ConfigResponse::new(record, content)),
            Err(e) => {
                tracing::warn!(name = %record.name, kind = %config_type, error = %e, "Skipping config without a stored document");
            }
        }
    }
    Ok(Json(configs))
}

async fn get_config(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Path(config_id): Path<i64>,
) -> ApiResult<Json<ConfigResponse>> {
    let record = owned(&state, config_type, config_id, &user).await?;

    let content = state
        .store
        .load_config(config_type.as_str(), &record.name)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found(format!(
                "{} config file not found in GitHub",
                config_type.title()
            )),
            other => ApiError::internal(format!(
                "Failed to load {config_type} from GitHub: {other}"
            )),
        })?;

    Ok(Json(ConfigResponse::new(record, content)))
}

async fn create_config(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Json(request): Json<ConfigCreate>,
) -> ApiResult<(StatusCode, Json<ConfigResponse>)> {
    user.require(DESIGNERS)?;

    if state
        .db
        .find_owned_config_by_name(&request.name, config_type, user.id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(format!(
            "{} with this name already exists",
            config_type.title()
        )));
    }

    let content = Value::Object(request.content);
    let kind = config_type.as_str();
    let github_sha = state
        .store
        .save_config(kind, &request.name, &content, None)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save {kind} to GitHub: {e}")))?;

    let record = state
        .db
        .create_design_config(&NewDesignConfig {
            name: request.name.clone(),
            config_type,
            owner_id: user.id,
            github_path: state.store.file_path(kind, &request.name),
            github_sha,
            description: request.description,
            tags: request.tags,
        })
        .await?;

    tracing::info!(id = record.id, name = %record.name, kind, owner = %user.username, "Created design config");
    Ok((StatusCode::CREATED, Json(ConfigResponse::new(record, content))))
}

async fn update_config(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Path(config_id): Path<i64>,
    Json(request): Json<ConfigUpdate>,
) -> ApiResult<Json<ConfigResponse>> {
    user.require(DESIGNERS)?;
    let mut record = owned(&state, config_type, config_id, &user).await?;
    let kind = config_type.as_str();

    let old_name = record.name.clone();
    let new_name = request
        .name
        .clone()
        .filter(|name| !name.is_empty() && *name != old_name);
    if let Some(name) = &new_name {
        let taken = state
            .db
            .find_owned_config_by_name(name, config_type, user.id)
            .await?
            .is_some_and(|other| other.id != record.id);
        if taken {
            return Err(ApiError::bad_request(format!(
                "{} with this name already exists",
                config_type.title()
            )));
        }
    }
    let target = new_name.clone().unwrap_or_else(|| old_name.clone());
    let update_failed = |e: StorageError| ApiError::internal(format!("Failed to update {kind} in GitHub: {e}"));

    // A rename without new content moves the stored document.
    let content = match (&request.content, &new_name) {
        (Some(content), _) => Some(Value::Object(content.clone())),
        (None, Some(_)) => match state.store.load_config(kind, &old_name).await {
            Ok(existing) => Some(existing),
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(name = %old_name, kind, "Renaming config with no stored document");
                None
            }
            Err(e) => return Err(update_failed(e)),
        },
        (None, None) => None,
    };

    if let Some(content) = &content {
        let sha = state
            .store
            .save_config(kind, &target, content, None)
            .await
            .map_err(update_failed)?;
        record.github_sha = Some(sha);
    }

    if new_name.is_some() {
        let new_path = state.store.file_path(kind, &target);
        // Names that sanitize to the same path share one document.
        if content.is_some() && new_path != state.store.file_path(kind, &old_name) {
            match state.store.delete_config(kind, &old_name).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) => tracing::warn!(name = %old_name, kind, error = %e, "Failed to remove renamed document"),
            }
        }
        record.github_path = Some(new_path);
        record.name = target;
    }
    if let Some(description) = request.description {
        record.description = Some(description);
    }
    if let Some(tags) = request.tags {
        record.tags = Some(tags);
    }

    let record = state.db.update_design_config(&record).await?;

    let content = match state.store.load_config(kind, &record.name).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::debug!(name = %record.name, error = %e, "Falling back to submitted content");
            content.unwrap_or_else(|| Value::Object(Map::new()))
        }
    };

    Ok(Json(ConfigResponse::new(record, content)))
}

async fn delete_config(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Path(config_id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.require(DESIGNERS)?;
    let record = owned(&state, config_type, config_id, &user).await?;
    let kind = config_type.as_str();

    match state.store.delete_config(kind, &record.name).await {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => {
            return Err(ApiError::internal(format!(
                "Failed to delete {kind} from GitHub: {e}"
            )))
        }
    }

    state.db.delete_design_config(record.id).await?;
    tracing::info!(id = record.id, name = %record.name, kind, "Deleted design config");
    Ok(StatusCode::NO_CONTENT)
}
