//! Login and logout against the backend's token endpoint.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::AuthError;
use super::store::CredentialStore;
use super::token::{is_stale, Credential, TokenResponse};
use crate::config::ClientConfig;

/// Snapshot of the stored session, as reported by [`AuthService::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    LoggedOut,
    Active { expires_at: Option<DateTime<Utc>> },
    /// Inside the proactive refresh window or already expired; the next
    /// request will refresh.
    Stale { expires_at: Option<DateTime<Utc>> },
}

/// Credential lifecycle outside the refresh coordinator: creation at login
/// and explicit logout.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use hitos_client::auth::{AuthService, MemoryCredentialStore};
/// use hitos_client::config::ClientConfig;
///
/// # async fn example() -> Result<(), hitos_client::auth::AuthError> {
/// let config = ClientConfig::new("http://localhost:8000");
/// let service = AuthService::new(&config, reqwest::Client::new(), Arc::new(MemoryCredentialStore::new()));
/// service.login("ana", "secret").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    client: reqwest::Client,
    token_url: String,
    stale_threshold: std::time::Duration,
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(
        config: &ClientConfig,
        client: reqwest::Client,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            token_url: config.endpoint("token"),
            stale_threshold: config.stale_threshold,
            store,
        }
    }

    /// Exchange username and password for a credential and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginRejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Serialization(format!("invalid token response: {err}")))?;
        let credential = Credential::from(payload);
        self.store.set(&credential)?;
        tracing::info!(username, "logged in");
        Ok(credential)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    pub fn status(&self) -> Result<SessionStatus, AuthError> {
        let Some(credential) = self.store.get()? else {
            return Ok(SessionStatus::LoggedOut);
        };
        let expires_at = credential.expires_at();
        if is_stale(&credential, self.stale_threshold) {
            Ok(SessionStatus::Stale { expires_at })
        } else {
            Ok(SessionStatus::Active { expires_at })
        }
    }

    /// The stored credential, or [`AuthError::NotLoggedIn`] when there is none.
    pub fn require_session(&self) -> Result<Credential, AuthError> {
        self.store.get()?.ok_or(AuthError::NotLoggedIn)
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }
}
