//! Session state and PocketBase user authentication.

mod client;
mod store;

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pocketbase::ApiError;
use crate::util::unix_timestamp_now;

pub use client::PocketBaseAuth;
pub use store::{AuthStore, IdentityResolver};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Public fields of the signed-in `users` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AuthUser {
    /// Best human-readable label for the user
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.username, &self.name, &self.email]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub record: AuthUser,
}

impl AuthSession {
    /// `exp` claim of the token, if it has one
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<i64> {
        token_payload(&self.token)
            .and_then(|payload| payload.get("exp").and_then(serde_json::Value::as_f64))
            .map(|exp| exp as i64)
    }

    /// A token whose payload cannot be decoded is never valid; one without an
    /// `exp` claim never expires.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_valid(&self) -> bool {
        let Some(payload) = token_payload(&self.token) else {
            return false;
        };
        payload
            .get("exp")
            .and_then(serde_json::Value::as_f64)
            .is_none_or(|exp| exp > unix_timestamp_now() as f64)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("record", &self.record)
            .finish()
    }
}

/// Decode the JSON payload segment of a JWT without verifying it
fn token_payload(token: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let segment = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<serde_json::Value>(&bytes).ok()? {
        serde_json::Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Auth API error: {0}")]
    Api(#[from] ApiError),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Durable home for the current session (OS keychain, file, ...)
pub trait SessionPersistence: Send + Sync {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Check registration form input before anything is sent
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> AuthResult<()> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(AuthError::InvalidInput("Please fill in every field".to_string()));
    }
    if password != confirm {
        return Err(AuthError::InvalidInput("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Unsigned JWT carrying the given claims
    pub fn token_with_claims(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    pub fn session_for(user_id: &str) -> AuthSession {
        AuthSession {
            token: token_with_claims(&serde_json::json!({
                "id": user_id,
                "exp": unix_timestamp_now() + 3600,
            })),
            record: AuthUser {
                id: user_id.to_string(),
                email: Some(format!("{user_id}@example.com")),
                username: Some(user_id.to_string()),
                name: None,
            },
        }
    }

    pub fn expired_session_for(user_id: &str) -> AuthSession {
        AuthSession {
            token: token_with_claims(&serde_json::json!({
                "id": user_id,
                "exp": unix_timestamp_now() - 60,
            })),
            ..session_for(user_id)
        }
    }
}
