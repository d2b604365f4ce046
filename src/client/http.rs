//! Shared HTTP client construction and response helpers.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};

use crate::error::ClientError;

/// Build the client used for resource calls and refreshes.
///
/// The timeout also bounds refresh calls; a timed-out refresh is an
/// ordinary refresh failure.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .default_headers(headers)
        .build()
        .map_err(|err| ClientError::Configuration(format!("failed to build HTTP client: {err}")))
}

/// Map a non-success status and body to a [`ClientError`].
pub fn status_to_error(status: StatusCode, body: &str) -> ClientError {
    let message = extract_detail(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.to_string()
        }
    });
    ClientError::api(status.as_u16(), message)
}

/// Pass a success response through; turn anything else into an error.
pub async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_to_error(status, &body))
}

/// Body text of an error response, for error messages.
pub async fn error_body(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    extract_detail(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        }
    })
}

// The backend reports errors as `{"detail": "..."}` or `{"detail": [{"msg": ...}]}`.
fn extract_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let detail = value.get("detail")?;
    if let Some(text) = detail.as_str() {
        return Some(text.to_string());
    }
    let messages: Vec<&str> = detail
        .as_array()?
        .iter()
        .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
        .collect();
    (!messages.is_empty()).then(|| messages.join("; "))
}
