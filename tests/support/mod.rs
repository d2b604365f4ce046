#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hitos_client::auth::{Credential, CredentialStore, LoginRedirect, MemoryCredentialStore};
use hitos_client::client::ApiClient;
use hitos_client::config::ClientConfig;
use serde_json::json;
use wiremock::MockServer;

/// Unsigned JWT carrying `sub` and `exp`.
pub fn jwt(subject: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": subject, "exp": exp }).to_string());
    format!("{header}.{payload}.sig-{subject}")
}

/// JWT expiring `secs` seconds from now (negative for already expired).
pub fn jwt_expiring_in(subject: &str, secs: i64) -> String {
    jwt(subject, Utc::now().timestamp() + secs)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({ "access_token": access, "refresh_token": refresh, "token_type": "bearer" })
}

/// Counts login redirects.
#[derive(Default)]
pub struct CountingRedirect {
    hits: AtomicUsize,
}

impl CountingRedirect {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for CountingRedirect {
    fn redirect_to_login(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub store: Arc<MemoryCredentialStore>,
    pub redirect: Arc<CountingRedirect>,
}

impl Harness {
    pub fn stored(&self) -> Option<Credential> {
        self.store.get().expect("memory store read")
    }
}

pub fn harness(server: &MockServer, credential: Option<Credential>) -> Harness {
    harness_with_timeout(server, credential, Duration::from_secs(5))
}

pub fn harness_with_timeout(
    server: &MockServer,
    credential: Option<Credential>,
    timeout: Duration,
) -> Harness {
    let store = Arc::new(match credential {
        Some(credential) => MemoryCredentialStore::with_credential(credential),
        None => MemoryCredentialStore::new(),
    });
    let redirect = CountingRedirect::new();
    let config = ClientConfig::new(server.uri())
        .with_stale_threshold(Duration::from_secs(300))
        .with_request_timeout(timeout);
    let client = ApiClient::new(config, store.clone(), redirect.clone()).expect("client builds");
    Harness {
        client,
        store,
        redirect,
    }
}
