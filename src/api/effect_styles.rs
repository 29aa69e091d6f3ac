//! Effect style library

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, DESIGNERS};
use super::AppState;
use crate::core::effect_styles::{style_tree, EffectStyleConfig, EffectorSet, StyleBranch, ValidatedStyle};
use crate::database::{EffectStyleInput, EffectStyleOps, EffectStyleRecord};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_styles).post(create_style))
        .route("/:style_id", get(get_style).put(update_style).delete(delete_style))
}

#[derive(Debug, Deserialize)]
pub struct StyleFilter {
    #[serde(default)]
    pub style_type: Option<String>,
}

/// Stored style with its JSON columns decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectStyleResponse {
    pub id: i64,
    pub name: String,
    pub style_type: String,
    pub subtype: String,
    pub description: Option<String>,
    pub process_verb: Option<String>,
    pub execution_probability: f64,
    pub effector_config: Value,
    pub style_attributes: Option<Value>,
    pub created_by_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<EffectStyleRecord> for EffectStyleResponse {
    fn from(record: EffectStyleRecord) -> Self {
        Self {
            effector_config: record.effector_config_json(),
            style_attributes: record.style_attributes_json(),
            id: record.id,
            name: record.name,
            style_type: record.style_type,
            subtype: record.subtype,
            description: record.description,
            process_verb: record.process_verb,
            execution_probability: record.execution_probability,
            created_by_id: record.created_by_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn to_input(style: ValidatedStyle) -> ApiResult<EffectStyleInput> {
    let effector_config = serde_json::to_value(&style.effector_config)
        .map_err(|e| ApiError::internal(format!("Failed to encode effectors: {e}")))?;
    Ok(EffectStyleInput {
        name: style.name,
        style_type: style.style_type.as_str().to_string(),
        subtype: style.subtype,
        description: style.description,
        process_verb: style.process_verb,
        execution_probability: style.execution_probability,
        effector_config,
        style_attributes: style.style_attributes,
    })
}

fn not_found(style_id: i64) -> ApiError {
    ApiError::not_found(format!("EffectStyle with id {style_id} not found"))
}

async fn list_styles(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<StyleFilter>,
) -> ApiResult<Json<IndexMap<&'static str, StyleBranch<EffectStyleResponse>>>> {
    let style_type = filter.style_type.as_deref().filter(|s| !s.is_empty());
    let records = state.db.list_effect_styles(style_type).await?;

    let tree = style_tree(records.into_iter().map(|record| {
        let response = EffectStyleResponse::from(record);
        (response.style_type.clone(), response)
    }));
    Ok(Json(tree))
}

async fn get_style(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(style_id): Path<i64>,
) -> ApiResult<Json<EffectStyleResponse>> {
    let record = state
        .db
        .get_effect_style(style_id)
        .await?
        .ok_or_else(|| not_found(style_id))?;
    Ok(Json(record.into()))
}

async fn create_style(
    State(state): State<AppState>,
    user: AuthUser,
    Json(config): Json<EffectStyleConfig>,
) -> ApiResult<Json<EffectStyleResponse>> {
    user.require(DESIGNERS)?;

    let validated = config.validate(None).map_err(ApiError::BadRequest)?;
    let record = state
        .db
        .create_effect_style(&to_input(validated)?, user.id)
        .await?;

    tracing::info!(id = record.id, name = %record.name, style_type = %record.style_type, "Created effect style");
    Ok(Json(record.into()))
}

async fn update_style(
    State(state): State<AppState>,
    user: AuthUser,
    Path(style_id): Path<i64>,
    Json(config): Json<EffectStyleConfig>,
) -> ApiResult<Json<EffectStyleResponse>> {
    user.require(DESIGNERS)?;

    let existing = state
        .db
        .get_effect_style(style_id)
        .await?
        .ok_or_else(|| not_found(style_id))?;
    let stored: Option<EffectorSet> = serde_json::from_str(&existing.effector_config).ok();

    let validated = config.validate(stored.as_ref()).map_err(ApiError::BadRequest)?;
    let record = state
        .db
        .update_effect_style(style_id, &to_input(validated)?)
        .await?
        .ok_or_else(|| not_found(style_id))?;
    Ok(Json(record.into()))
}

async fn delete_style(
    State(state): State<AppState>,
    user: AuthUser,
    Path(style_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    user.require(DESIGNERS)?;

    if !state.db.delete_effect_style(style_id).await? {
        return Err(not_found(style_id));
    }
    Ok(Json(json!({ "message": format!("EffectStyle {style_id} deleted successfully") })))
}
