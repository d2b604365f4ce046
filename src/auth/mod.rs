//! Credentials, their storage, and the single-flight refresh protocol.

pub mod coordinator;
pub mod error;
pub mod redirect;
pub mod service;
pub mod store;
pub mod token;

pub use coordinator::RefreshCoordinator;
pub use error::AuthError;
pub use redirect::{LogRedirect, LoginRedirect, NoopRedirect};
pub use service::{AuthService, SessionStatus};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token::{is_stale, is_stale_at, AccessClaims, Credential};
