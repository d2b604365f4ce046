//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthService, Credential, CredentialStore, FileCredentialStore, LogRedirect,
    LoginRedirect, MemoryCredentialStore, RefreshCoordinator,
};
pub use crate::client::{ApiClient, ApiRequest};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
