//! Promotion of design configs into the production table

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, DESIGNERS};
use super::{AppState, Pagination};
use crate::core::store::StorageError;
use crate::database::{ApprovedConfigOps, ApprovedConfigRecord, ConfigType, DesignConfigOps};

pub fn router() -> Router<AppState> {
    let mut router = Router::new();
    for config_type in ConfigType::all() {
        router = router.nest(
            &format!("/{}", config_type.plural()),
            Router::new()
                .route("/:config_id/approve", post(approve))
                .route("/approved", get(list_approved))
                .route("/approved/:name", get(get_approved))
                .layer(Extension(*config_type)),
        );
    }
    router
}

/// Approved snapshot with its content decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedConfigResponse {
    pub id: i64,
    pub name: String,
    pub config_type: String,
    pub config_content: Value,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub github_path: Option<String>,
    pub approved_at: String,
    pub updated_at: Option<String>,
}

impl TryFrom<ApprovedConfigRecord> for ApprovedConfigResponse {
    type Error = ApiError;

    fn try_from(record: ApprovedConfigRecord) -> Result<Self, Self::Error> {
        let config_content = record.content().map_err(|e| {
            ApiError::internal(format!("Corrupt approved content for {}: {e}", record.name))
        })?;
        Ok(Self {
            id: record.id,
            name: record.name,
            config_type: record.config_type,
            config_content,
            description: record.description,
            tags: record.tags,
            github_path: record.github_path,
            approved_at: record.approved_at,
            updated_at: record.updated_at,
        })
    }
}

async fn approve(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    user: AuthUser,
    Path(config_id): Path<i64>,
) -> ApiResult<Json<ApprovedConfigResponse>> {
    user.require(DESIGNERS)?;

    let design = state
        .db
        .get_config_by_type(config_id, config_type)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} config not found", config_type.title())))?;

    let content = state
        .store
        .load_config(config_type.as_str(), &design.name)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Config file not found in GitHub"),
            other => ApiError::internal(format!("Failed to load config from GitHub: {other}")),
        })?;

    let approved = state.db.approve_config(&design, &content, user.id).await?;
    tracing::info!(
        id = design.id,
        name = %design.name,
        kind = %config_type,
        approver = %user.username,
        "Approved config"
    );
    Ok(Json(approved.try_into()?))
}

async fn list_approved(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    _user: AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ApprovedConfigResponse>>> {
    let records = state
        .db
        .list_approved_configs(config_type, page.skip, page.limit)
        .await?;
    let approved = records
        .into_iter()
        .map(ApprovedConfigResponse::try_from)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(approved))
}

/// Game-side lookup by name.
async fn get_approved(
    State(state): State<AppState>,
    Extension(config_type): Extension<ConfigType>,
    _user: AuthUser,
    Path(name): Path<String>,
) -> ApiResult<Json<ApprovedConfigResponse>> {
    let record = state
        .db
        .get_approved_config(config_type, &name)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Approved {config_type} '{name}' not found"))
        })?;
    Ok(Json(record.try_into()?))
}
