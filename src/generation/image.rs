//! Image resolver: generate, fetch, store, return a public URL.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, ImageStage, Result};
use crate::models::ModelRegistry;
use crate::provider::http::fetch_bytes;
use crate::provider::{AdapterSet, ImageOptions, ImageSource};
use crate::storage::{object_name, StorageProvider};
use crate::util::timeout::with_timeout;

/// One image generation request.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct ImageRequest {
    #[builder(into)]
    pub prompt: String,
    #[builder(into)]
    pub filename_prefix: String,
    /// Merged over the model's default options; these win on conflict.
    #[builder(default)]
    #[serde(default)]
    pub override_options: ImageOptions,
    #[builder(into)]
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
}

/// Resolves image requests. Images are never retried.
#[derive(Clone)]
pub struct ImageResolver {
    registry: Arc<ModelRegistry>,
    adapters: AdapterSet,
    storage: Arc<dyn StorageProvider>,
    folder: String,
    attempt_timeout: Option<Duration>,
}

impl ImageResolver {
    pub fn new(
        registry: Arc<ModelRegistry>,
        adapters: AdapterSet,
        storage: Arc<dyn StorageProvider>,
        config: &ForgeConfig,
    ) -> Self {
        Self {
            registry,
            adapters,
            storage,
            folder: config.image_folder.clone(),
            attempt_timeout: config.attempt_timeout(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Generate an image and return the stored file's public URL.
    ///
    /// Unknown models and unavailable adapters fail as configuration errors
    /// before any network call; every later failure is an
    /// [`ForgeError::ImageGeneration`] tagged with the stage that failed.
    pub async fn generate(&self, request: &ImageRequest) -> Result<ImageResult> {
        let span = info_span!("image", request_id = %Uuid::new_v4());
        self.generate_inner(request).instrument(span).await
    }

    async fn generate_inner(&self, request: &ImageRequest) -> Result<ImageResult> {
        if request.prompt.trim().is_empty() {
            return Err(ForgeError::InvalidArgument("image prompt must not be empty".into()));
        }
        let descriptor = self.registry.resolve_image(request.model_id.as_deref())?;
        let adapter = self.adapters.image(descriptor.vendor)?;
        let vendor_model_id = descriptor.vendor_model_id.as_str();

        let mut options = adapter.default_options(vendor_model_id, &request.prompt);
        for (key, value) in &request.override_options {
            options.insert(key.clone(), value.clone());
        }
        debug!(
            vendor = %descriptor.vendor,
            model = %descriptor.id,
            options = %serde_json::Value::Object(options.clone()),
            "Image generation"
        );

        let output = with_timeout(
            descriptor.vendor,
            self.attempt_timeout,
            adapter.generate(&request.prompt, vendor_model_id, &options),
        )
        .await
        .map_err(|e| e.into_image_error(ImageStage::VendorCall))?;

        let bytes = match output.into_source()? {
            ImageSource::Inline(bytes) => bytes,
            ImageSource::Remote(url) => {
                debug!(url = %url, "Fetching generated image");
                fetch_bytes(&url).await?
            }
        };

        let ext = adapter.output_format(vendor_model_id);
        let file_name = object_name(
            &self.folder,
            &request.filename_prefix,
            chrono::Utc::now().timestamp_millis(),
            &ext,
        );
        let url = self
            .storage
            .save_file(&file_name, bytes, &format!("image/{ext}"))
            .await
            .map_err(|e| e.into_image_error(ImageStage::Storage))?;

        info!(file = %file_name, url = %url, "Image stored");
        Ok(ImageResult { url })
    }
}
