//! Completion resolver: model selection plus temperature stepdown.
//!
//! Every entry point runs the same loop. Attempts are made sequentially at
//! the requested temperature and then at each lower ladder rung. An empty
//! or unacceptable answer moves on to the next rung; any `Err` from the
//! adapter (transport, auth, timeout) ends the call immediately.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::config::ForgeConfig;
use crate::error::{ContractViolation, ForgeError, Result, ViolationReason};
use crate::models::ModelRegistry;
use crate::provider::{AdapterSet, TextCall};
use crate::util::html::sanitize_html;
use crate::util::timeout::with_timeout;

use super::prompts;
use super::stepdown::{json_kind, parse_structured, TemperatureLadder};

/// Default sampling temperature when a request does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// One text completion request.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[builder(into)]
    pub system_text: String,
    #[builder(into)]
    pub user_text: String,
    #[builder(default = DEFAULT_TEMPERATURE)]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Registry id; the configured default text model when absent.
    #[builder(into)]
    #[serde(default)]
    pub model_id: Option<String>,
}

impl CompletionRequest {
    pub fn new(system_text: impl Into<String>, user_text: impl Into<String>, temperature: f64) -> Self {
        Self {
            system_text: system_text.into(),
            user_text: user_text.into(),
            temperature,
            model_id: None,
        }
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

/// Naming-style preview request: one example set per style.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub styles: Vec<String>,
    #[builder(into)]
    pub prompt: String,
    #[builder(default = DEFAULT_TEMPERATURE)]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[builder(into)]
    #[serde(default)]
    pub model_id: Option<String>,
}

/// Example names for one naming style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewExample {
    pub people: Vec<String>,
    pub locations: Vec<String>,
}

/// Resolves text completions against the registry and adapter set.
///
/// Holds no per-request state; share one instance behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CompletionResolver {
    registry: Arc<ModelRegistry>,
    adapters: AdapterSet,
    ladder: TemperatureLadder,
    attempt_timeout: Option<Duration>,
    debug_raw_responses: bool,
}

impl CompletionResolver {
    pub fn new(registry: Arc<ModelRegistry>, adapters: AdapterSet, config: &ForgeConfig) -> Result<Self> {
        Ok(Self {
            registry,
            adapters,
            ladder: TemperatureLadder::new(config.temperature_ladder.clone())?,
            attempt_timeout: config.attempt_timeout(),
            debug_raw_responses: config.debug_raw_responses,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn ladder(&self) -> &TemperatureLadder {
        &self.ladder
    }

    /// Complete and parse the answer as a JSON object or array.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Value> {
        let system = prompts::json_system(&request.system_text);
        self.run("json", &system, request, |raw| {
            parse_structured(raw).ok_or(ViolationReason::Unparseable)
        })
        .await
    }

    /// Like [`complete`](Self::complete), but only a JSON object is accepted.
    pub async fn complete_object(&self, request: &CompletionRequest) -> Result<Map<String, Value>> {
        let system = prompts::json_system(&request.system_text);
        self.run("object", &system, request, |raw| {
            match parse_structured(raw).ok_or(ViolationReason::Unparseable)? {
                Value::Object(map) => Ok(map),
                other => Err(shape_mismatch("object", json_kind(&other))),
            }
        })
        .await
    }

    /// Complete and decode into `T`. A decode failure counts as a rejected
    /// attempt, so the ladder continues.
    pub async fn complete_as<T: DeserializeOwned>(&self, request: &CompletionRequest) -> Result<T> {
        let system = prompts::json_system(&request.system_text);
        self.run("typed", &system, request, |raw| {
            let value = parse_structured(raw).ok_or(ViolationReason::Unparseable)?;
            serde_json::from_value(value)
                .map_err(|e| shape_mismatch(std::any::type_name::<T>(), &e.to_string()))
        })
        .await
    }

    /// Generate example names for each requested style.
    ///
    /// The answer must be an array with exactly one entry per style.
    pub async fn preview(&self, request: &PreviewRequest) -> Result<Vec<PreviewExample>> {
        if request.styles.is_empty() {
            return Err(ForgeError::InvalidArgument(
                "preview needs at least one naming style".into(),
            ));
        }
        let expected = request.styles.len();
        let system = prompts::preview_system(&request.styles);
        let completion = CompletionRequest {
            system_text: system.clone(),
            user_text: request.prompt.clone(),
            temperature: request.temperature,
            model_id: request.model_id.clone(),
        };
        self.run("preview", &system, &completion, |raw| {
            let items = match parse_structured(raw).ok_or(ViolationReason::Unparseable)? {
                Value::Array(items) => items,
                other => {
                    return Err(shape_mismatch(
                        &format!("array of {expected}"),
                        json_kind(&other),
                    ))
                }
            };
            if items.len() != expected {
                return Err(shape_mismatch(
                    &format!("array of {expected}"),
                    &format!("array of {}", items.len()),
                ));
            }
            serde_json::from_value(Value::Array(items))
                .map_err(|e| shape_mismatch("array of {people, locations}", &e.to_string()))
        })
        .await
    }

    /// Complete in HTML mode and return sanitized HTML.
    ///
    /// The first attempt that is still non-empty after sanitizing wins.
    pub async fn complete_html(&self, request: &CompletionRequest) -> Result<String> {
        let system = prompts::html_system(&request.system_text);
        self.run("html", &system, request, |raw| {
            let html = sanitize_html(raw);
            if html.is_empty() {
                Err(ViolationReason::Empty)
            } else {
                Ok(html)
            }
        })
        .await
    }

    async fn run<T, F>(
        &self,
        mode: &'static str,
        system_text: &str,
        request: &CompletionRequest,
        accept: F,
    ) -> Result<T>
    where
        F: FnMut(&str) -> std::result::Result<T, ViolationReason>,
    {
        let span = info_span!("completion", request_id = %Uuid::new_v4(), mode);
        self.stepdown(system_text, request, accept)
            .instrument(span)
            .await
    }

    async fn stepdown<T, F>(
        &self,
        system_text: &str,
        request: &CompletionRequest,
        mut accept: F,
    ) -> Result<T>
    where
        F: FnMut(&str) -> std::result::Result<T, ViolationReason>,
    {
        let candidates = self.ladder.candidates(request.temperature)?;
        let descriptor = self.registry.resolve_text(request.model_id.as_deref())?;
        let adapter = self.adapters.text(descriptor.vendor)?;

        let mut tried = Vec::with_capacity(candidates.len());
        let mut last_raw = None;
        let mut reason = ViolationReason::Empty;

        for temperature in candidates {
            tried.push(temperature);
            debug!(
                vendor = %descriptor.vendor,
                model = %descriptor.id,
                temperature,
                attempt = tried.len(),
                "Completion attempt"
            );

            let call = TextCall {
                system_text,
                user_text: &request.user_text,
                temperature,
                vendor_model_id: &descriptor.vendor_model_id,
            };
            let output =
                with_timeout(descriptor.vendor, self.attempt_timeout, adapter.complete(&call)).await?;

            let Some(raw) = output.filter(|text| !text.trim().is_empty()) else {
                warn!(temperature, "Vendor returned no usable content");
                reason = ViolationReason::Empty;
                continue;
            };
            if self.debug_raw_responses {
                debug!(temperature, raw = %raw, "Raw vendor output");
            } else {
                trace!(temperature, len = raw.len(), "Vendor output received");
            }

            match accept(&raw) {
                Ok(value) => {
                    debug!(temperature, attempts = tried.len(), "Completion accepted");
                    return Ok(value);
                }
                Err(rejected) => {
                    warn!(temperature, reason = ?rejected, "Vendor output rejected");
                    reason = rejected;
                    last_raw = Some(raw);
                }
            }
        }

        Err(ContractViolation {
            system_text: system_text.to_string(),
            user_text: request.user_text.clone(),
            temperatures: tried,
            last_raw,
            reason,
        }
        .into())
    }
}

fn shape_mismatch(expected: &str, actual: &str) -> ViolationReason {
    ViolationReason::ShapeMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
