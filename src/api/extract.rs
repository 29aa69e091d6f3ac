//! Request authentication
//!
//! [`AuthUser`] resolves the bearer token to an active user record.

use std::ops::Deref;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::database::{UserOps, UserRecord, UserRole};

/// Roles allowed to author content.
pub const DESIGNERS: &[UserRole] = &[UserRole::Designer, UserRole::Admin];

pub const ADMINS: &[UserRole] = &[UserRole::Admin];

/// The authenticated, active caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRecord);

impl AuthUser {
    /// 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[UserRole]) -> ApiResult<()> {
        if roles.contains(&self.0.role()) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Not enough permissions".to_string()))
        }
    }
}

impl Deref for AuthUser {
    type Target = UserRecord;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError::Unauthorized("Not authenticated".to_string())
        })?;

        let claims = state.tokens.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            ApiError::credentials()
        })?;

        let user = state
            .db
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or_else(ApiError::credentials)?;

        if !user.is_active {
            return Err(ApiError::bad_request("Inactive user"));
        }
        Ok(AuthUser(user))
    }
}
