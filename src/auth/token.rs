use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Access + refresh token pair held by a [`CredentialStore`](super::store::CredentialStore).
///
/// Both halves are always replaced together; a store never pairs an access
/// token from one refresh cycle with a refresh token from another.
///
/// # Example
/// ```
/// use hitos_client::auth::Credential;
///
/// let credential = Credential::new("access", "refresh");
/// assert_eq!(credential.refresh_token, "refresh");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Decode the `exp` claim of the access token.
    pub fn claims(&self) -> Result<AccessClaims, AuthError> {
        AccessClaims::decode(&self.access_token)
    }

    /// Expiry of the access token, if it can be decoded.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims()
            .ok()
            .and_then(|claims| DateTime::<Utc>::from_timestamp(claims.exp, 0))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"..")
            .field("refresh_token", &"..")
            .finish()
    }
}

/// Token pair as returned by `/token` and `/refresh-token`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenResponse> for Credential {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

/// The subset of the access token payload this client reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
}

impl AccessClaims {
    /// Decode the payload segment of a JWT without verifying its signature.
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let _header = parts
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| AuthError::MalformedAccessToken("missing JWT header".into()))?;
        let payload = parts
            .next()
            .ok_or_else(|| AuthError::MalformedAccessToken("missing JWT payload".into()))?;
        // Some issuers keep the padding; URL_SAFE_NO_PAD rejects it.
        let payload = payload.trim_end_matches('=');
        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedAccessToken("invalid payload encoding".into()))?;
        serde_json::from_slice(&decoded)
            .map_err(|_| AuthError::MalformedAccessToken("payload has no numeric exp claim".into()))
    }
}

/// Whether the access token expires within `threshold` from now.
///
/// Any decode failure counts as stale so that a refresh is attempted.
pub fn is_stale(credential: &Credential, threshold: Duration) -> bool {
    is_stale_at(credential, threshold, Utc::now())
}

/// [`is_stale`] evaluated against an explicit clock reading.
pub fn is_stale_at(credential: &Credential, threshold: Duration, now: DateTime<Utc>) -> bool {
    match credential.claims() {
        Ok(claims) => {
            let threshold = i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX);
            now.timestamp() >= claims.exp.saturating_sub(threshold)
        }
        Err(error) => {
            tracing::debug!(%error, "treating undecodable access token as stale");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{payload}.signature")
    }

    fn credential_expiring_at(exp: i64) -> Credential {
        Credential::new(jwt_with(&format!(r#"{{"sub":"ana","exp":{exp}}}"#)), "refresh")
    }

    #[test]
    fn decodes_exp_claim() {
        let credential = credential_expiring_at(1_700_000_000);
        assert_eq!(credential.claims().unwrap().exp, 1_700_000_000);
        assert_eq!(
            credential.expires_at().map(|at| at.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn stale_one_second_inside_threshold() {
        let now = Utc::now();
        let threshold = Duration::from_secs(300);
        let credential = credential_expiring_at(now.timestamp() + 300 - 1);
        assert!(is_stale_at(&credential, threshold, now));
    }

    #[test]
    fn fresh_one_second_outside_threshold() {
        let now = Utc::now();
        let threshold = Duration::from_secs(300);
        let credential = credential_expiring_at(now.timestamp() + 300 + 1);
        assert!(!is_stale_at(&credential, threshold, now));
    }

    #[test]
    fn stale_exactly_at_threshold() {
        let now = Utc::now();
        let credential = credential_expiring_at(now.timestamp() + 60);
        assert!(is_stale_at(&credential, Duration::from_secs(60), now));
    }

    #[test]
    fn already_expired_is_stale() {
        let now = Utc::now();
        let credential = credential_expiring_at(now.timestamp() - 10);
        assert!(is_stale_at(&credential, Duration::ZERO, now));
    }

    #[test]
    fn undecodable_tokens_are_stale() {
        for access in ["", "not-a-jwt", "a.%%%.c", "a.b.c"] {
            let credential = Credential::new(access, "refresh");
            assert!(is_stale(&credential, Duration::from_secs(300)), "{access:?}");
        }
    }

    #[test]
    fn payload_without_exp_is_malformed() {
        let credential = Credential::new(jwt_with(r#"{"sub":"ana"}"#), "refresh");
        assert!(matches!(
            credential.claims(),
            Err(AuthError::MalformedAccessToken(_))
        ));
        assert!(is_stale(&credential, Duration::ZERO));
    }

    #[test]
    fn padded_payload_still_decodes() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":42}"#);
        let claims = AccessClaims::decode(&format!("{header}.{payload}.sig")).unwrap();
        assert_eq!(claims.exp, 42);
    }

    #[test]
    fn debug_output_hides_tokens() {
        let rendered = format!("{:?}", Credential::new("secret-a", "secret-r"));
        assert!(!rendered.contains("secret"));
    }
}
