//! OpenAI Chat Completions adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::models::Vendor;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{vendor_credentials, TextAdapter, TextCall};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    api_key: String,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build from configuration, failing if the vendor is disabled or has no key.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let (api_key, base_url) = vendor_credentials(config, Vendor::OpenAi)?;
        Ok(Self::new(api_key, base_url))
    }

    fn build_request_body(call: &TextCall<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": call.vendor_model_id,
            "messages": [
                { "role": "system", "content": call.system_text },
                { "role": "user", "content": call.user_text },
            ],
            "temperature": call.temperature,
        })
    }
}

#[async_trait]
impl TextAdapter for OpenAiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAi
    }

    async fn complete(&self, call: &TextCall<'_>) -> Result<Option<String>> {
        let body = Self::build_request_body(call);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        debug!(
            model = call.vendor_model_id,
            temperature = call.temperature,
            "OpenAI complete"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::OpenAi, e))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(Vendor::OpenAi, status, &body_text));
        }

        let data: OpenAiChatResponse = resp
            .json()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::OpenAi, e))?;

        Ok(data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()))
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}
