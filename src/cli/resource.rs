//! CLI handler for reading resources through the refresh-aware pipeline.

use crate::client::http::ensure_success;
use crate::client::{ApiClient, ApiRequest};

/// Handle `hitos get <path>`.
pub async fn handle_get(
    client: &ApiClient,
    path: &str,
    query: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error>> {
    client.auth().require_session()?;
    let request = query
        .iter()
        .fold(ApiRequest::get(path), |request, (k, v)| {
            request.query(k.as_str(), v.as_str())
        });
    let response = ensure_success(client.send(request).await?).await?;
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
