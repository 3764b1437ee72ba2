//! Vendor adapter traits and implementations.
//!
//! Adapters are constructed once at startup from [`ForgeConfig`] and shared
//! across requests through an [`AdapterSet`]. They hold no per-request state.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "replicate")]
pub mod replicate;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, ImageStage, Result};
use crate::models::{Capability, Vendor};

/// Vendor-specific image input options, merged as a flat JSON object.
pub type ImageOptions = serde_json::Map<String, serde_json::Value>;

/// One text completion call against a vendor.
#[derive(Debug, Clone, Copy)]
pub struct TextCall<'a> {
    pub system_text: &'a str,
    pub user_text: &'a str,
    pub temperature: f64,
    pub vendor_model_id: &'a str,
}

/// Adapter for a text-completion vendor.
#[async_trait]
pub trait TextAdapter: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Run one completion.
    ///
    /// `Ok(None)` means the vendor answered without usable content; the
    /// caller may try again. Transport and auth failures are `Err` and must
    /// not be retried.
    async fn complete(&self, call: &TextCall<'_>) -> Result<Option<String>>;
}

/// Adapter for an image-generation vendor.
#[async_trait]
pub trait ImageAdapter: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Default input options for a model, before caller overrides.
    fn default_options(&self, vendor_model_id: &str, prompt: &str) -> ImageOptions;

    /// File extension of the images the model produces.
    fn output_format(&self, vendor_model_id: &str) -> String;

    async fn generate(
        &self,
        prompt: &str,
        vendor_model_id: &str,
        options: &ImageOptions,
    ) -> Result<ImageOutput>;
}

/// Lazily evaluated image URL, for vendor outputs that hand back a handle
/// instead of a plain string.
pub struct UrlAccessor(Box<dyn Fn() -> String + Send + Sync>);

impl UrlAccessor {
    pub fn new(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn url(&self) -> String {
        (self.0)()
    }
}

impl fmt::Debug for UrlAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UrlAccessor(..)")
    }
}

/// Raw output of an image vendor.
#[derive(Debug)]
pub enum ImageOutput {
    Url(String),
    Accessor(UrlAccessor),
    Bytes(Vec<u8>),
}

/// Normalized image output: something to fetch, or bytes already in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Inline(Vec<u8>),
}

impl ImageOutput {
    /// Collapse every output shape into an [`ImageSource`].
    ///
    /// `data:` URLs are decoded in place rather than fetched.
    pub fn into_source(self) -> Result<ImageSource> {
        let url = match self {
            Self::Bytes(bytes) => return Ok(ImageSource::Inline(bytes)),
            Self::Url(url) => url,
            Self::Accessor(accessor) => accessor.url(),
        };
        if url.trim().is_empty() {
            return Err(ForgeError::image(
                ImageStage::VendorCall,
                "Vendor returned an empty image URL",
            ));
        }
        match url.strip_prefix("data:") {
            Some(data) => decode_data_url(data).map(ImageSource::Inline),
            None => Ok(ImageSource::Remote(url)),
        }
    }
}

fn decode_data_url(data: &str) -> Result<Vec<u8>> {
    let (meta, payload) = data.split_once(',').ok_or_else(|| {
        ForgeError::image(ImageStage::VendorCall, "Malformed data URL in vendor output")
    })?;
    if !meta.ends_with(";base64") {
        return Err(ForgeError::image(
            ImageStage::VendorCall,
            format!("Unsupported data URL encoding '{meta}'"),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ForgeError::image(ImageStage::VendorCall, format!("Invalid base64 image: {e}")))
}

/// A vendor slot: either a ready adapter or the reason it could not start.
pub enum AdapterSlot<T: ?Sized> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Clone for AdapterSlot<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(adapter) => Self::Ready(Arc::clone(adapter)),
            Self::Unavailable(reason) => Self::Unavailable(reason.clone()),
        }
    }
}

/// Adapters available to the resolvers, keyed by vendor.
#[derive(Clone, Default)]
pub struct AdapterSet {
    text: HashMap<Vendor, AdapterSlot<dyn TextAdapter>>,
    image: HashMap<Vendor, AdapterSlot<dyn ImageAdapter>>,
}

impl fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |ready: bool| if ready { "ready" } else { "unavailable" };
        let mut out = f.debug_struct("AdapterSet");
        for vendor in Vendor::ALL {
            if let Some(slot) = self.text.get(&vendor) {
                out.field(vendor.as_str(), &describe(matches!(slot, AdapterSlot::Ready(_))));
            }
            if let Some(slot) = self.image.get(&vendor) {
                out.field(vendor.as_str(), &describe(matches!(slot, AdapterSlot::Ready(_))));
            }
        }
        out.finish()
    }
}

impl AdapterSet {
    /// An empty set; every lookup fails with `AdapterInit`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize every compiled-in vendor once from configuration.
    ///
    /// Vendors without credentials, or disabled by configuration, are kept
    /// as unavailable slots so that selecting them fails fast.
    pub fn from_config(config: &ForgeConfig) -> Self {
        let mut set = Self::new();

        #[cfg(feature = "openai")]
        match openai::OpenAiAdapter::from_config(config) {
            Ok(adapter) => set = set.with_text_adapter(Arc::new(adapter)),
            Err(e) => set = set.with_unavailable(Capability::Text, Vendor::OpenAi, unavailable_reason(e)),
        }
        #[cfg(not(feature = "openai"))]
        {
            set = set.with_unavailable(Capability::Text, Vendor::OpenAi, "support not compiled in");
        }

        #[cfg(feature = "anthropic")]
        match anthropic::AnthropicAdapter::from_config(config) {
            Ok(adapter) => set = set.with_text_adapter(Arc::new(adapter)),
            Err(e) => {
                set = set.with_unavailable(Capability::Text, Vendor::Anthropic, unavailable_reason(e))
            }
        }
        #[cfg(not(feature = "anthropic"))]
        {
            set = set.with_unavailable(Capability::Text, Vendor::Anthropic, "support not compiled in");
        }

        #[cfg(feature = "replicate")]
        match replicate::ReplicateAdapter::from_config(config) {
            Ok(adapter) => set = set.with_image_adapter(Arc::new(adapter)),
            Err(e) => {
                set = set.with_unavailable(Capability::Image, Vendor::Replicate, unavailable_reason(e))
            }
        }
        #[cfg(not(feature = "replicate"))]
        {
            set = set.with_unavailable(Capability::Image, Vendor::Replicate, "support not compiled in");
        }

        #[cfg(not(all(feature = "openai", feature = "anthropic", feature = "replicate")))]
        let _ = config;
        set
    }

    pub fn with_text_adapter(mut self, adapter: Arc<dyn TextAdapter>) -> Self {
        self.text.insert(adapter.vendor(), AdapterSlot::Ready(adapter));
        self
    }

    pub fn with_image_adapter(mut self, adapter: Arc<dyn ImageAdapter>) -> Self {
        self.image.insert(adapter.vendor(), AdapterSlot::Ready(adapter));
        self
    }

    pub fn with_unavailable(
        mut self,
        capability: Capability,
        vendor: Vendor,
        reason: impl Into<String>,
    ) -> Self {
        let slot = reason.into();
        match capability {
            Capability::Text => {
                self.text.insert(vendor, AdapterSlot::Unavailable(slot));
            }
            Capability::Image => {
                self.image.insert(vendor, AdapterSlot::Unavailable(slot));
            }
        }
        self
    }

    /// The text adapter for a vendor, or `AdapterInit` if it cannot be used.
    pub fn text(&self, vendor: Vendor) -> Result<Arc<dyn TextAdapter>> {
        match self.text.get(&vendor) {
            Some(AdapterSlot::Ready(adapter)) => Ok(Arc::clone(adapter)),
            Some(AdapterSlot::Unavailable(reason)) => Err(ForgeError::AdapterInit {
                vendor,
                reason: reason.clone(),
            }),
            None => Err(ForgeError::AdapterInit {
                vendor,
                reason: "no text adapter registered".into(),
            }),
        }
    }

    /// The image adapter for a vendor, or `AdapterInit` if it cannot be used.
    pub fn image(&self, vendor: Vendor) -> Result<Arc<dyn ImageAdapter>> {
        match self.image.get(&vendor) {
            Some(AdapterSlot::Ready(adapter)) => Ok(Arc::clone(adapter)),
            Some(AdapterSlot::Unavailable(reason)) => Err(ForgeError::AdapterInit {
                vendor,
                reason: reason.clone(),
            }),
            None => Err(ForgeError::AdapterInit {
                vendor,
                reason: "no image adapter registered".into(),
            }),
        }
    }

    pub fn is_ready(&self, capability: Capability, vendor: Vendor) -> bool {
        match capability {
            Capability::Text => matches!(self.text.get(&vendor), Some(AdapterSlot::Ready(_))),
            Capability::Image => matches!(self.image.get(&vendor), Some(AdapterSlot::Ready(_))),
        }
    }
}

/// Read the API key and base URL for a vendor, or explain why it is unusable.
#[cfg_attr(not(any(feature = "openai", feature = "anthropic", feature = "replicate")), allow(dead_code))]
pub(crate) fn vendor_credentials(
    config: &ForgeConfig,
    vendor: Vendor,
) -> Result<(String, Option<String>)> {
    let settings = config.vendor(vendor);
    if !settings.is_enabled() {
        return Err(ForgeError::AdapterInit {
            vendor,
            reason: format!("disabled by configuration ({}=false)", vendor.enable_var()),
        });
    }
    let api_key = settings.api_key.clone().ok_or_else(|| ForgeError::AdapterInit {
        vendor,
        reason: format!("missing {}", vendor.api_key_vars().join(" or ")),
    })?;
    Ok((api_key, settings.base_url.clone()))
}

#[cfg_attr(not(any(feature = "openai", feature = "anthropic", feature = "replicate")), allow(dead_code))]
fn unavailable_reason(err: ForgeError) -> String {
    match err {
        ForgeError::AdapterInit { reason, .. } => reason,
        other => other.to_string(),
    }
}
