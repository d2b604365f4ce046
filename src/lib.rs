//! hitos-client: authenticated HTTP client for the hitos compliance console
//!
//! Wraps every backend call in a request pipeline that keeps the bearer
//! credential fresh: tokens about to expire are refreshed before sending,
//! and a 401 triggers one refresh and one replay. However many requests
//! discover a stale credential at once, a single refresh call is made and
//! all of them share its outcome.
//!
//! # Quick Start
//!
//! ```no_run
//! use hitos_client::prelude::*;
//!
//! # async fn example() -> hitos_client::error::Result<()> {
//! let client = ApiClient::from_env()?;
//! client.auth().login("ana", "secret").await?;
//! let milestones: serde_json::Value = client.get_json("/hitos").await?;
//! println!("{milestones}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
