//! Replicate adapter (prediction-based image API).
//!
//! Predictions are created with `Prefer: wait`, which usually returns a
//! finished prediction. Anything still running is polled until it reaches
//! a terminal status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::models::Vendor;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{vendor_credentials, ImageAdapter, ImageOptions, ImageOutput};

const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const FALLBACK_OUTPUT_FORMAT: &str = "webp";

/// Per-model input defaults and output format.
struct ModelProfile {
    vendor_model_id: &'static str,
    output_format: &'static str,
    defaults: fn(&str) -> Value,
}

static PROFILES: &[ModelProfile] = &[
    ModelProfile {
        vendor_model_id: "minimax/image-01",
        output_format: "jpg",
        defaults: minimax_defaults,
    },
    ModelProfile {
        vendor_model_id: "black-forest-labs/flux-1.1-pro",
        output_format: "webp",
        defaults: flux_11_pro_defaults,
    },
    ModelProfile {
        vendor_model_id: "black-forest-labs/flux-schnell",
        output_format: "webp",
        defaults: flux_schnell_defaults,
    },
    ModelProfile {
        vendor_model_id: "black-forest-labs/flux-schnell-lora",
        output_format: "webp",
        defaults: flux_schnell_lora_defaults,
    },
];

fn minimax_defaults(prompt: &str) -> Value {
    json!({
        "prompt": prompt,
        "aspect_ratio": "3:4",
        "number_of_images": 1,
        "prompt_optimizer": true,
    })
}

fn flux_11_pro_defaults(prompt: &str) -> Value {
    json!({
        "prompt": prompt,
        "aspect_ratio": "3:4",
        "output_format": "webp",
        "output_quality": 80,
        "safety_tolerance": 5,
        "prompt_upsampling": true,
    })
}

fn flux_schnell_defaults(prompt: &str) -> Value {
    json!({
        "prompt": prompt,
        "steps": 25,
        "width": 1024,
        "height": 1024,
        "guidance": 3,
        "interval": 2,
        "aspect_ratio": "3:4",
        "output_format": "webp",
        "output_quality": 80,
        "safety_tolerance": 5,
        "prompt_upsampling": false,
    })
}

fn flux_schnell_lora_defaults(prompt: &str) -> Value {
    json!({
        "prompt": prompt,
        "go_fast": true,
        "lora_scale": 0.8,
        "megapixels": "1",
        "num_outputs": 1,
        "aspect_ratio": "3:4",
        "lora_weights": "fofr/flux-black-light",
        "output_format": "webp",
        "output_quality": 80,
        "num_inference_steps": 4,
    })
}

fn profile(vendor_model_id: &str) -> Option<&'static ModelProfile> {
    PROFILES.iter().find(|p| p.vendor_model_id == vendor_model_id)
}

pub struct ReplicateAdapter {
    api_key: String,
    base_url: String,
    poll_interval: Duration,
}

impl ReplicateAdapter {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build from configuration, failing if the vendor is disabled or has no key.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let (api_key, base_url) = vendor_credentials(config, Vendor::Replicate)?;
        Ok(Self::new(api_key, base_url))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `owner/name` runs the model's latest version; `owner/name:version`
    /// pins a version.
    fn create_request(&self, vendor_model_id: &str, input: &ImageOptions) -> (String, Value) {
        match vendor_model_id.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.base()),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{vendor_model_id}/predictions", self.base()),
                json!({ "input": input }),
            ),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Prediction> {
        let resp = request
            .headers(bearer_headers(&self.api_key))
            .send()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::Replicate, e))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(Vendor::Replicate, status, &body_text));
        }

        resp.json()
            .await
            .map_err(|e| ForgeError::vendor_transport(Vendor::Replicate, e))
    }

    async fn wait_for(&self, mut prediction: Prediction) -> Result<Prediction> {
        while !prediction.is_terminal() {
            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|u| u.get.clone())
                .ok_or_else(|| ForgeError::VendorCall {
                    vendor: Vendor::Replicate,
                    status: None,
                    message: format!("Prediction {} has no polling URL", prediction.id),
                    source: None,
                })?;
            tokio::time::sleep(self.poll_interval).await;
            debug!(id = %prediction.id, status = %prediction.status, "Polling Replicate prediction");
            prediction = self.send(shared_client().get(&poll_url)).await?;
        }
        Ok(prediction)
    }
}

#[async_trait]
impl ImageAdapter for ReplicateAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Replicate
    }

    fn default_options(&self, vendor_model_id: &str, prompt: &str) -> ImageOptions {
        match profile(vendor_model_id).map(|p| (p.defaults)(prompt)) {
            Some(Value::Object(map)) => map,
            _ => {
                let mut map = ImageOptions::new();
                map.insert("prompt".into(), Value::String(prompt.to_string()));
                map
            }
        }
    }

    fn output_format(&self, vendor_model_id: &str) -> String {
        profile(vendor_model_id)
            .map(|p| p.output_format)
            .unwrap_or(FALLBACK_OUTPUT_FORMAT)
            .to_string()
    }

    async fn generate(
        &self,
        prompt: &str,
        vendor_model_id: &str,
        options: &ImageOptions,
    ) -> Result<ImageOutput> {
        let mut input = options.clone();
        input
            .entry("prompt")
            .or_insert_with(|| Value::String(prompt.to_string()));

        let (url, body) = self.create_request(vendor_model_id, &input);
        debug!(model = vendor_model_id, "Replicate create prediction");

        let request = shared_client()
            .post(&url)
            .header("Prefer", HeaderValue::from_static("wait"))
            .json(&body);
        let prediction = self.wait_for(self.send(request).await?).await?;

        if prediction.status == "succeeded" {
            return prediction.into_output();
        }
        Err(ForgeError::VendorCall {
            vendor: Vendor::Replicate,
            status: None,
            message: format!(
                "Prediction {} {}: {}",
                prediction.id,
                prediction.status,
                prediction
                    .error
                    .as_ref()
                    .map(error_text)
                    .unwrap_or_else(|| "no error detail".to_string())
            ),
            source: None,
        })
    }
}

fn error_text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

// Replicate API response types (internal)

#[derive(Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    /// Outputs are a single URL or a list whose first entry is the image.
    fn into_output(self) -> Result<ImageOutput> {
        let first = match self.output {
            Some(Value::Array(items)) => items.into_iter().next(),
            other => other,
        };
        match first {
            Some(Value::String(url)) => Ok(ImageOutput::Url(url)),
            other => Err(ForgeError::VendorCall {
                vendor: Vendor::Replicate,
                status: None,
                message: format!("Unexpected prediction output: {}", other.unwrap_or(Value::Null)),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ReplicateAdapter {
        ReplicateAdapter::new("r8-test".into(), Some("http://replicate.test/v1/".into()))
    }

    #[test]
    fn defaults_follow_model_profile() {
        let options = adapter().default_options("minimax/image-01", "a tavern");
        assert_eq!(options["prompt"], "a tavern");
        assert_eq!(options["aspect_ratio"], "3:4");
        assert_eq!(options["prompt_optimizer"], true);
        assert_eq!(adapter().output_format("minimax/image-01"), "jpg");
        assert_eq!(adapter().output_format("black-forest-labs/flux-1.1-pro"), "webp");
    }

    #[test]
    fn unknown_model_gets_prompt_only() {
        let options = adapter().default_options("someone/else", "a tower");
        assert_eq!(options.len(), 1);
        assert_eq!(adapter().output_format("someone/else"), "webp");
    }

    #[test]
    fn versioned_models_use_predictions_endpoint() {
        let (url, body) = adapter().create_request("owner/model:abc123", &ImageOptions::new());
        assert_eq!(url, "http://replicate.test/v1/predictions");
        assert_eq!(body["version"], "abc123");

        let (url, body) = adapter().create_request("minimax/image-01", &ImageOptions::new());
        assert_eq!(url, "http://replicate.test/v1/models/minimax/image-01/predictions");
        assert!(body.get("version").is_none());
    }

    #[test]
    fn array_output_takes_first_url() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "p1",
            "status": "succeeded",
            "output": ["https://replicate.delivery/a.webp", "https://replicate.delivery/b.webp"]
        }))
        .unwrap();
        match prediction.into_output().unwrap() {
            ImageOutput::Url(url) => assert_eq!(url, "https://replicate.delivery/a.webp"),
            other => panic!("expected url, got {other:?}"),
        }
    }

    #[test]
    fn missing_output_is_vendor_error() {
        let prediction: Prediction =
            serde_json::from_value(json!({"id": "p2", "status": "succeeded", "output": null}))
                .unwrap();
        assert!(matches!(
            prediction.into_output(),
            Err(ForgeError::VendorCall { vendor: Vendor::Replicate, .. })
        ));
    }
}
