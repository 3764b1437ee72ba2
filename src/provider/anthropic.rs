//! Anthropic Messages API adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::models::Vendor;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::{vendor_credentials, TextAdapter, TextCall};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicAdapter {
    api_key: String,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build from configuration, failing if the vendor is disabled or has no key.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let (api_key, base_url) = vendor_credentials(config, Vendor::Anthropic)?;
        Ok(Self::new(api_key, base_url))
    }

    fn build_request_body(call: &TextCall<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": call.vendor_model_id,
            "system": call.system_text,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": call.user_text }],
            "temperature": call.temperature,
        })
    }
}

#[async_trait]
impl TextAdapter for AnthropicAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    async fn complete(&self, call: &TextCall<'_>) -> Result<Option<String>> {
        let body = Self::build_request_body(call);
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

        debug!(
            model = call.vendor_model_id,
            temperature = call.temperature,
            "Anthropic complete"
        );

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::Anthropic, e))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(Vendor::Anthropic, status, &body_text));
        }

        let data: AnthropicResponse = resp
            .json()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::Anthropic, e))?;

        // Only a leading text block counts; anything else is "no usable content".
        Ok(match data.content.into_iter().next() {
            Some(AnthropicContentBlock::Text { text }) => {
                Some(text.trim().to_string()).filter(|t| !t.is_empty())
            }
            _ => None,
        })
    }
}

// Anthropic API response types (internal)

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
