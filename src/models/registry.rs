//! Immutable model registry.

use std::collections::HashMap;

use super::{Capability, ModelDescriptor, ModelSummary, Vendor};
use crate::error::{ForgeError, Result};

pub const DEFAULT_TEXT_MODEL_ID: &str = "GPT_4o_mini";
pub const DEFAULT_IMAGE_MODEL_ID: &str = "Minimax_Image";

/// Lookup table from caller-facing model ids to descriptors.
///
/// Text and image models live in separate tables with independent
/// defaults. The registry is never mutated after construction.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    text: Table,
    image: Table,
}

#[derive(Debug, Clone)]
struct Table {
    capability: Capability,
    order: Vec<String>,
    entries: HashMap<String, ModelDescriptor>,
    default_id: String,
}

impl Table {
    fn new(
        capability: Capability,
        descriptors: Vec<ModelDescriptor>,
        default_id: &str,
    ) -> Result<Self> {
        let mut order = Vec::with_capacity(descriptors.len());
        let mut entries = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if descriptor.capability != capability {
                return Err(ForgeError::Configuration(format!(
                    "Model '{}' is a {} model, not {capability}",
                    descriptor.id, descriptor.capability
                )));
            }
            if entries.contains_key(&descriptor.id) {
                return Err(ForgeError::Configuration(format!(
                    "Duplicate {capability} model id '{}'",
                    descriptor.id
                )));
            }
            order.push(descriptor.id.clone());
            entries.insert(descriptor.id.clone(), descriptor);
        }
        if !entries.contains_key(default_id) {
            return Err(ForgeError::UnknownModel {
                capability,
                model_id: default_id.to_string(),
            });
        }
        Ok(Self {
            capability,
            order,
            entries,
            default_id: default_id.to_string(),
        })
    }

    // The built-in tables are known to be consistent.
    fn builtin(capability: Capability, descriptors: Vec<ModelDescriptor>, default_id: &str) -> Self {
        Self {
            capability,
            order: descriptors.iter().map(|d| d.id.clone()).collect(),
            entries: descriptors.into_iter().map(|d| (d.id.clone(), d)).collect(),
            default_id: default_id.to_string(),
        }
    }

    fn resolve(&self, model_id: Option<&str>) -> Result<&ModelDescriptor> {
        let id = model_id.unwrap_or(&self.default_id);
        self.entries.get(id).ok_or_else(|| ForgeError::UnknownModel {
            capability: self.capability,
            model_id: id.to_string(),
        })
    }

    fn list(&self) -> Vec<ModelSummary> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(ModelDescriptor::summary)
            .collect()
    }
}

impl ModelRegistry {
    /// Build a registry from explicit tables and defaults.
    pub fn new(
        text: Vec<ModelDescriptor>,
        image: Vec<ModelDescriptor>,
        default_text: &str,
        default_image: &str,
    ) -> Result<Self> {
        Ok(Self {
            text: Table::new(Capability::Text, text, default_text)?,
            image: Table::new(Capability::Image, image, default_image)?,
        })
    }

    /// The built-in offering with its stock defaults.
    pub fn builtin() -> Self {
        Self {
            text: Table::builtin(Capability::Text, builtin_text(), DEFAULT_TEXT_MODEL_ID),
            image: Table::builtin(Capability::Image, builtin_image(), DEFAULT_IMAGE_MODEL_ID),
        }
    }

    /// The built-in offering with configured defaults.
    pub fn with_defaults(default_text: Option<&str>, default_image: Option<&str>) -> Result<Self> {
        Self::new(
            builtin_text(),
            builtin_image(),
            default_text.unwrap_or(DEFAULT_TEXT_MODEL_ID),
            default_image.unwrap_or(DEFAULT_IMAGE_MODEL_ID),
        )
    }

    /// Resolve a text model, falling back to the text default.
    pub fn resolve_text(&self, model_id: Option<&str>) -> Result<&ModelDescriptor> {
        self.text.resolve(model_id)
    }

    /// Resolve an image model, falling back to the image default.
    pub fn resolve_image(&self, model_id: Option<&str>) -> Result<&ModelDescriptor> {
        self.image.resolve(model_id)
    }

    pub fn resolve(&self, capability: Capability, model_id: Option<&str>) -> Result<&ModelDescriptor> {
        match capability {
            Capability::Text => self.resolve_text(model_id),
            Capability::Image => self.resolve_image(model_id),
        }
    }

    pub fn list_text(&self) -> Vec<ModelSummary> {
        self.text.list()
    }

    pub fn list_image(&self) -> Vec<ModelSummary> {
        self.image.list()
    }

    pub fn default_text_id(&self) -> &str {
        &self.text.default_id
    }

    pub fn default_image_id(&self) -> &str {
        &self.image.default_id
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_text() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            "GPT_4o_mini",
            Capability::Text,
            Vendor::OpenAi,
            "gpt-4o-mini",
            "GPT-4o Mini",
            "From OpenAI. High-quality, $0.15/million tokens, but subject to $5/year minimum. Best if you are using your OpenAI token for other things so the minimum doesn't matter",
        ),
        ModelDescriptor::new(
            "Claude_3_haiku",
            Capability::Text,
            Vendor::Anthropic,
            "claude-3-haiku-20240307",
            "Claude 3 Haiku",
            "From Anthropic. High-quality, $0.25/million tokens, but subject to $5/year minimum. Best if you are using your Anthropic token for other things so the minimum doesn't matter",
        ),
    ]
}

fn builtin_image() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            "Minimax_Image",
            Capability::Image,
            Vendor::Replicate,
            "minimax/image-01",
            "Minimax Image",
            "From Replicate. Slow, variable (usually moderate to good) quality, but only $0.01",
        ),
        ModelDescriptor::new(
            "Flux_1_1_Pro",
            Capability::Image,
            Vendor::Replicate,
            "black-forest-labs/flux-1.1-pro",
            "Flux 1.1 Pro",
            "From Replicate. Fast, high-quality, $0.04 per image",
        ),
        ModelDescriptor::new(
            "Flux_Pro",
            Capability::Image,
            Vendor::Replicate,
            "black-forest-labs/flux-schnell",
            "Flux Pro",
            "From Replicate. Fairly Fast, high-quality, $0.055 per image.  Generally recommend 1.1 instead",
        ),
        ModelDescriptor::new(
            "Flux_Schnell_Lora",
            Capability::Image,
            Vendor::Replicate,
            "black-forest-labs/flux-schnell-lora",
            "Flux Schnell Lora",
            "From Replicate. Fairly Fast, high-quality, $0.055 per image.  Generally recommend 1.1 instead",
        ),
    ]
}
