use thiserror::Error;

use crate::error::ClientError;

/// Authentication failures raised by the refresh coordinator and login flow.
///
/// `Clone` so that one refresh outcome can be delivered to every waiter of
/// the same cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No refresh token stored")]
    NoRefreshToken,
    #[error("Refresh rejected{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    RefreshRejected {
        status: Option<u16>,
        message: String,
    },
    #[error("Malformed access token: {0}")]
    MalformedAccessToken(String),
    #[error("Authorization failure: {0}")]
    AuthorizationFailure(String),
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Login rejected (status {status}): {message}")]
    LoginRejected { status: u16, message: String },
    #[error("Refresh cancelled before completion")]
    Cancelled,
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether a refresh that failed with this error ended the session.
    ///
    /// A completed cycle clears the stored credential and redirects on any
    /// failure, store errors included. Only a cancelled leader leaves the
    /// session in place.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for ClientError {
    fn from(error: AuthError) -> Self {
        ClientError::Auth(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rejected_display_includes_status() {
        let error = AuthError::RefreshRejected {
            status: Some(401),
            message: "expired".into(),
        };
        assert_eq!(error.to_string(), "Refresh rejected (status 401): expired");
    }

    #[test]
    fn refresh_rejected_display_without_status() {
        let error = AuthError::RefreshRejected {
            status: None,
            message: "connection reset".into(),
        };
        assert_eq!(error.to_string(), "Refresh rejected: connection reset");
    }

    #[test]
    fn terminal_errors() {
        assert!(AuthError::NoRefreshToken.is_terminal());
        assert!(AuthError::Io("disk full".into()).is_terminal());
        assert!(!AuthError::Cancelled.is_terminal());
    }
}
