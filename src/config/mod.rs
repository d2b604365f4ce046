//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::store::default_credential_path;
use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STALE_THRESHOLD_MINUTES: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_BASE_URL: &str = "HITOS_API_URL";
const ENV_THRESHOLD_MINUTES: &str = "HITOS_REFRESH_THRESHOLD_MINUTES";
const ENV_TIMEOUT_SECS: &str = "HITOS_TIMEOUT_SECS";
const ENV_CREDENTIALS_PATH: &str = "HITOS_CREDENTIALS_PATH";

/// Settings shared by the request pipeline, refresh coordinator and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root; endpoint paths are joined onto it.
    pub base_url: String,
    /// How long before expiry a token is refreshed proactively.
    pub stale_threshold: Duration,
    /// Timeout applied to every HTTP call, including refreshes.
    pub request_timeout: Duration,
    /// Location used by [`FileCredentialStore`](crate::auth::FileCredentialStore).
    pub credential_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stale_threshold: Duration::from_secs(DEFAULT_STALE_THRESHOLD_MINUTES * 60),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_path: default_credential_path(),
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv(); // missing .env is fine
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::new(
            lookup(ENV_BASE_URL)
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        );
        if let Some(minutes) = lookup(ENV_THRESHOLD_MINUTES) {
            config.stale_threshold =
                Duration::from_secs(parse_u64(ENV_THRESHOLD_MINUTES, &minutes)? * 60);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_u64(ENV_TIMEOUT_SECS, &secs)?);
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_PATH).filter(|p| !p.is_empty()) {
            config.credential_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    /// Absolute URL for an endpoint path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_u64(var: &str, value: &str) -> Result<u64, ClientError> {
    value.trim().parse::<u64>().map_err(|_| {
        ClientError::Configuration(format!("{var} must be a non-negative integer, got {value:?}"))
    })
}
