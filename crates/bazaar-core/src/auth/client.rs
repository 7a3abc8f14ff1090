//! Password auth against the `users` collection.

use serde::Deserialize;

use super::{validate_registration, AuthError, AuthResult, AuthSession, AuthStore, AuthUser};
use crate::pocketbase::{collections, ApiError, PocketBaseClient, RecordApi, UserRecord};

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    record: UserRecord,
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            record: AuthUser {
                id: response.record.id,
                email: response.record.email,
                username: response.record.username,
                name: response.record.name,
            },
        }
    }
}

/// `auth-methods` response; newer servers nest providers under `oauth2`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthMethodsResponse {
    #[serde(default)]
    oauth2: Option<OAuth2Methods>,
    #[serde(default)]
    auth_providers: Vec<AuthProvider>,
}

#[derive(Debug, Default, Deserialize)]
struct OAuth2Methods {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    providers: Vec<AuthProvider>,
}

#[derive(Debug, Deserialize)]
struct AuthProvider {
    name: String,
}

impl AuthMethodsResponse {
    fn provider_names(self) -> Vec<String> {
        let providers = match self.oauth2 {
            Some(oauth2) if oauth2.enabled || !oauth2.providers.is_empty() => oauth2.providers,
            _ => self.auth_providers,
        };
        providers.into_iter().map(|provider| provider.name).collect()
    }
}

/// Sign-in, sign-up and session refresh for end users
#[derive(Clone)]
pub struct PocketBaseAuth {
    client: PocketBaseClient,
}

impl PocketBaseAuth {
    #[must_use]
    pub const fn new(client: PocketBaseClient) -> Self {
        Self { client }
    }

    fn store(&self) -> &AuthStore {
        self.client.auth_store()
    }

    fn users_url(&self, action: &str) -> String {
        self.client
            .url(&format!("/api/collections/{}/{action}", collections::USERS))
    }

    /// Sign in with email or username and save the session
    pub async fn auth_with_password(&self, identity: &str, password: &str) -> AuthResult<AuthSession> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AuthError::InvalidInput("Email or username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Password is required".to_string()));
        }

        let request = self
            .client
            .http()
            .post(self.users_url("auth-with-password"))
            .json(&serde_json::json!({
                "identity": identity,
                "password": password,
            }));
        let response: AuthResponse = self.client.send_json(request).await?;
        let session = AuthSession::from(response);

        self.store().save(session.clone())?;
        tracing::info!("Signed in as {}", session.record.display_name());
        Ok(session)
    }

    /// Create a user account, then sign in with it
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> AuthResult<AuthSession> {
        validate_registration(username, email, password, confirm)?;

        let body = serde_json::json!({
            "username": username.trim(),
            "email": email.trim(),
            "password": password,
            "passwordConfirm": confirm,
            "name": username.trim(),
            "role": "user",
        });
        self.client
            .create::<UserRecord>(collections::USERS, &body)
            .await
            .map_err(registration_error)?;

        self.auth_with_password(email, password).await
    }

    /// Exchange the current token for a fresh one
    pub async fn refresh(&self) -> AuthResult<AuthSession> {
        if self.store().token().is_none() {
            return Err(AuthError::NotAuthenticated);
        }

        let request = self.client.http().post(self.users_url("auth-refresh"));
        match self.client.send_json::<AuthResponse>(request).await {
            Ok(response) => {
                let session = AuthSession::from(response);
                self.store().save(session.clone())?;
                Ok(session)
            }
            Err(error) => {
                if error.is_auth_failure() {
                    tracing::warn!("Session rejected during refresh, signing out");
                    self.store().clear()?;
                }
                Err(error.into())
            }
        }
    }

    /// Forget the local session. The backend keeps no server-side state.
    pub fn logout(&self) -> AuthResult<()> {
        self.store().clear()
    }

    /// Names of the OAuth2 providers enabled for `users`
    pub async fn list_auth_methods(&self) -> AuthResult<Vec<String>> {
        let request = self.client.http().get(self.users_url("auth-methods"));
        let response: AuthMethodsResponse = self.client.send_json(request).await?;
        Ok(response.provider_names())
    }
}

fn registration_error(error: ApiError) -> AuthError {
    match &error {
        ApiError::Response { fields, .. } if fields.iter().any(|field| field == "email") => {
            AuthError::InvalidInput("Email is already in use".to_string())
        }
        ApiError::Response { fields, .. } if fields.iter().any(|field| field == "username") => {
            AuthError::InvalidInput("Username is already taken".to_string())
        }
        _ => AuthError::Api(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_becomes_session() {
        let response: AuthResponse = serde_json::from_value(serde_json::json!({
            "token": "abc.def.ghi",
            "record": {
                "id": "usr1",
                "email": "ali@example.com",
                "username": "ali",
                "name": "Ali",
                "verified": false
            }
        }))
        .unwrap();
        let session = AuthSession::from(response);
        assert_eq!(session.token, "abc.def.ghi");
        assert_eq!(session.record.id, "usr1");
        assert_eq!(session.record.username.as_deref(), Some("ali"));
    }

    #[test]
    fn provider_names_from_current_shape() {
        let response: AuthMethodsResponse = serde_json::from_value(serde_json::json!({
            "password": { "enabled": true, "identityFields": ["email", "username"] },
            "oauth2": { "enabled": true, "providers": [{ "name": "google", "displayName": "Google" }] }
        }))
        .unwrap();
        assert_eq!(response.provider_names(), vec!["google".to_string()]);
    }

    #[test]
    fn provider_names_from_legacy_shape() {
        let response: AuthMethodsResponse = serde_json::from_value(serde_json::json!({
            "usernamePassword": true,
            "emailPassword": true,
            "authProviders": [{ "name": "google", "authUrl": "https://accounts.google.com/..." }]
        }))
        .unwrap();
        assert_eq!(response.provider_names(), vec!["google".to_string()]);
    }

    #[test]
    fn duplicate_email_maps_to_friendly_message() {
        let error = registration_error(ApiError::Response {
            status: 400,
            message: "Failed to create record.".to_string(),
            fields: vec!["email".to_string()],
        });
        assert_eq!(error.to_string(), "Email is already in use");

        let error = registration_error(ApiError::Response {
            status: 400,
            message: "Failed to create record.".to_string(),
            fields: vec!["username".to_string()],
        });
        assert_eq!(error.to_string(), "Username is already taken");

        let error = registration_error(ApiError::from_response(500, ""));
        assert!(matches!(error, AuthError::Api(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_without_session_is_rejected() {
        let client = PocketBaseClient::new("http://127.0.0.1:1", AuthStore::new()).unwrap();
        let auth = PocketBaseAuth::new(client);
        assert!(matches!(auth.refresh().await, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_credentials_are_rejected_before_sending() {
        let client = PocketBaseClient::new("http://127.0.0.1:1", AuthStore::new()).unwrap();
        let auth = PocketBaseAuth::new(client);
        assert!(matches!(
            auth.auth_with_password("  ", "secret").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.auth_with_password("ali", "").await,
            Err(AuthError::InvalidInput(_))
        ));
    }
}
