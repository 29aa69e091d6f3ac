//! Password hashing and access tokens
//!
//! Passwords are stored as argon2 PHC strings. Access tokens are HS256 JWTs
//! carrying the username as `sub` and the user's role.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// Inputs longer than this are truncated before hashing. Older hashes were
/// produced under the same limit.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("Could not validate credentials")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Cut `password` to at most [`MAX_PASSWORD_BYTES`] without splitting a
/// UTF-8 sequence.
pub fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

pub fn hash_password(password: &str) -> AuthResult<String> {
    let mut salt_raw = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_raw);
    let salt = SaltString::encode_b64(&salt_raw).map_err(|e| AuthError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(truncate_password(password).as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// False on mismatch or on a malformed stored hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        tracing::warn!("bad password hash format");
        return false;
    };
    Argon2::default()
        .verify_password(truncate_password(password).as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and checks access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expire: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expire", &self.expire)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expire: Duration::minutes(expire_minutes),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.secret_key, config.access_token_expire_minutes)
    }

    pub fn create_access_token(&self, username: &str, role: &str) -> AuthResult<String> {
        self.create_token_with_expiry(username, role, self.expire)
    }

    pub fn create_token_with_expiry(&self, username: &str, role: &str, expires_in: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            role: role.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::Encode)
    }

    /// Verify signature and expiry.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}
