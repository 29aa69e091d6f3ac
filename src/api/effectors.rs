//! Effector types, templates and validation

use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::extract::{AuthUser, DESIGNERS};
use super::AppState;
use crate::core::effectors::{templates, EffectorConfig, EffectorTemplate, EffectorType};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/types", get(effector_types))
        .route("/", get(list_templates))
        .route("/validate", post(validate))
        .route("/create", post(create))
}

#[derive(Debug, Deserialize)]
pub struct TemplateFilter {
    #[serde(default)]
    pub effector_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectorResponse {
    pub effector_type: String,
    pub effector_name: String,
    pub config: Value,
}

/// Validation errors for a submitted effector, including the name the
/// designer must give it.
fn submission_errors(config: &EffectorConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if config.effector_name.as_deref().map_or(true, str::is_empty) {
        errors.push("effector_name is required".to_string());
    }
    errors.extend(config.validate());
    errors
}

async fn effector_types() -> Json<Vec<&'static str>> {
    Json(EffectorType::all().iter().map(EffectorType::as_str).collect())
}

/// Unknown type filters match nothing.
async fn list_templates(_user: AuthUser, Query(filter): Query<TemplateFilter>) -> Json<Vec<EffectorTemplate>> {
    let list = match filter.effector_type.as_deref() {
        None | Some("") => templates(None),
        Some(name) => match name.parse::<EffectorType>() {
            Ok(kind) => templates(Some(kind)),
            Err(_) => Vec::new(),
        },
    };
    Json(list)
}

async fn validate(_user: AuthUser, Json(config): Json<EffectorConfig>) -> Json<Value> {
    let errors = submission_errors(&config);
    if errors.is_empty() {
        Json(json!({ "valid": true, "message": "Effector configuration is valid" }))
    } else {
        Json(json!({ "valid": false, "errors": errors }))
    }
}

async fn create(user: AuthUser, Json(mut config): Json<EffectorConfig>) -> ApiResult<Json<EffectorResponse>> {
    user.require(DESIGNERS)?;

    let errors = submission_errors(&config);
    if !errors.is_empty() {
        return Err(ApiError::Invalid(errors));
    }

    config.extra.retain(|_, value| !value.is_null());
    let effector_type = config.effector_type.clone();
    let effector_name = config.effector_name.clone().unwrap_or_default();
    let config = serde_json::to_value(&config)?;

    Ok(Json(EffectorResponse {
        effector_type,
        effector_name,
        config,
    }))
}
