//! Shared HTTP client, headers, and status mapping.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{ForgeError, ImageStage, Result};
use crate::models::Vendor;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No request timeout; per-attempt limits are applied by the resolvers
/// when configured.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Build Anthropic-style headers (x-api-key).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

/// Map a non-success HTTP response onto a vendor call error.
pub fn status_to_error(vendor: Vendor, status: u16, body: &str) -> ForgeError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    ForgeError::vendor_status(vendor, status, message)
}

// OpenAI: {"error":{"message":..}}, Anthropic: {"error":{"type":..,"message":..}},
// Replicate: {"detail":..}
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|m| m.as_str())
        .or_else(|| value.get("detail").and_then(|d| d.as_str()))
        .map(str::to_string)
}

/// Download image bytes from a vendor-hosted URL.
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = shared_client()
        .get(url)
        .send()
        .await
        .map_err(|e| ForgeError::image(ImageStage::Fetch, format!("Failed to fetch image: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ForgeError::image(
            ImageStage::Fetch,
            format!(
                "Failed to fetch image: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            ),
        ));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ForgeError::image(ImageStage::Fetch, format!("Failed to read image: {e}")))?;
    Ok(bytes.to_vec())
}
