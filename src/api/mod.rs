//! HTTP API
//!
//! ## Routes
//! - `/api/auth`, `/api/users` - accounts and tokens
//! - `/api/items`, `/api/skills`, `/api/characters` - design configs
//! - `/api/approval` - promotion into the production table
//! - `/api/weapons`, `/api/spells` - damage analysis and quick-save
//! - `/api/effect-styles`, `/api/effectors` - style library and effector tools
//! - `/api/collaboration` - shared notes and user colors
//!
//! Collection routes answer with or without a trailing slash.

pub mod approval;
pub mod auth;
pub mod collaboration;
pub mod design_configs;
pub mod effect_styles;
pub mod effectors;
pub mod error;
pub mod extract;
pub mod users;
pub mod weapons;

pub use error::{ApiError, ApiResult};
pub use extract::AuthUser;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router, ServiceExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::Layer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::core::security::TokenService;
use crate::core::store::ConfigStore;
use crate::database::{ConfigType, Database};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub store: Arc<dyn ConfigStore>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, store: Arc<dyn ConfigStore>, config: AppConfig) -> Self {
        Self {
            db,
            store,
            tokens: TokenService::from_config(&config.auth),
            config: Arc::new(config),
        }
    }
}

/// `skip`/`limit` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Raveling MUD API", "version": crate::VERSION }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers mirror the request.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// All routes with state, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let mut app = Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/approval", approval::router())
        .nest("/api/weapons", weapons::weapon_router())
        .nest("/api/spells", weapons::spell_router())
        .nest("/api/effect-styles", effect_styles::router())
        .nest("/api/effectors", effectors::router())
        .nest("/api/collaboration", collaboration::router());

    for config_type in ConfigType::all() {
        app = app.nest(
            &format!("/api/{}", config_type.plural()),
            design_configs::router(*config_type),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// [`router`] behind trailing-slash normalization, ready to serve.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.config.server.bind;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = state.store.backend(), "Raveling API listening");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app(state)))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await
}
