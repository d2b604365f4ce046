//! Single-flight credential refresh.
//!
//! Any number of callers may ask for a refresh at the same time; exactly one
//! of them (the leader) calls the refresh endpoint and every other caller
//! waits in a FIFO queue for that same outcome.
//!
//! ```text
//! Idle --refresh()--> Refreshing --ok--> Succeeded --> Idle
//!                               \--err--> Failed ----> Idle
//! ```
//!
//! Callers arriving while `Refreshing` only join the queue; they never cause
//! a transition.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::oneshot;

use super::error::AuthError;
use super::redirect::LoginRedirect;
use super::store::CredentialStore;
use super::token::{Credential, TokenResponse};

type RefreshOutcome = Result<Credential, AuthError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Owns the refresh protocol and is the only writer of the credential store
/// after login.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use hitos_client::auth::{LogRedirect, MemoryCredentialStore, RefreshCoordinator};
///
/// # async fn example() -> Result<(), hitos_client::auth::AuthError> {
/// let coordinator = RefreshCoordinator::new(
///     reqwest::Client::new(),
///     "http://localhost:8000/refresh-token",
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(LogRedirect),
/// );
/// let credential = coordinator.refresh().await?;
/// # let _ = credential;
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator {
    client: reqwest::Client,
    refresh_url: String,
    store: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
    state: Mutex<RefreshState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .field("in_flight", &self.is_refreshing())
            .field("waiters", &self.pending_waiters())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        client: reqwest::Client,
        refresh_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            client,
            refresh_url: refresh_url.into(),
            store,
            redirect,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Whether a refresh cycle is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().in_flight
    }

    /// Number of callers queued behind the running cycle.
    pub fn pending_waiters(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Exchange the stored refresh token for a new credential.
    ///
    /// Joins the running cycle if there is one. On failure the store is
    /// cleared and the login redirect fires once for the cycle; every caller
    /// of that cycle receives the same error.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        let role = {
            let mut state = self.lock_state();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                tracing::debug!(position = state.waiters.len(), "joining in-flight refresh");
                Role::Waiter(rx)
            } else {
                state.in_flight = true;
                Role::Leader
            }
        };

        match role {
            Role::Waiter(rx) => rx.await.unwrap_or(Err(AuthError::Cancelled)),
            Role::Leader => self.lead().await,
        }
    }

    async fn lead(&self) -> RefreshOutcome {
        let cycle = CycleGuard {
            coordinator: self,
            finished: false,
        };
        tracing::debug!(url = %self.refresh_url, "starting credential refresh");

        let outcome = match self.exchange().await {
            Ok(credential) => self.store.set(&credential).map(|()| credential),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(_) => {
                let waiters = cycle.finish(&outcome);
                tracing::info!(waiters, "credential refreshed");
            }
            Err(error) => {
                if let Err(clear_error) = self.store.clear() {
                    tracing::error!(error = %clear_error, "failed to clear credentials");
                }
                let waiters = cycle.finish(&outcome);
                tracing::warn!(%error, waiters, "credential refresh failed");
                self.redirect.redirect_to_login();
            }
        }
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let refresh_token = self
            .store
            .get()?
            .map(|credential| credential.refresh_token)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NoRefreshToken)?;

        let response = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|err| AuthError::RefreshRejected {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(AuthError::RefreshRejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let payload: TokenResponse =
            response
                .json()
                .await
                .map_err(|err| AuthError::RefreshRejected {
                    status: Some(status.as_u16()),
                    message: format!("invalid refresh response: {err}"),
                })?;
        Ok(payload.into())
    }

    /// Leave `Refreshing` and deliver `outcome` to every queued waiter in
    /// arrival order. Returns how many waiters were released.
    fn complete(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock_state();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        let released = waiters.len();
        for waiter in waiters {
            // A waiter whose caller went away has nothing to receive.
            let _ = waiter.send(outcome.clone());
        }
        released
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ends the leader's cycle even if the leader's future is dropped mid-refresh.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(mut self, outcome: &RefreshOutcome) -> usize {
        self.finished = true;
        self.coordinator.complete(outcome)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let released = self.coordinator.complete(&Err(AuthError::Cancelled));
            tracing::debug!(waiters = released, "refresh leader cancelled");
        }
    }
}
