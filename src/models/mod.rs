//! Model definitions and the registry that resolves them.

pub mod registry;
pub mod vendor;

pub use registry::{ModelRegistry, DEFAULT_IMAGE_MODEL_ID, DEFAULT_TEXT_MODEL_ID};
pub use vendor::Vendor;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
    Text,
    Image,
}

/// One offered model.
///
/// `id` is the stable identifier exposed to callers; `vendor_model_id` is
/// the vendor's own model string and is never shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub capability: Capability,
    pub vendor: Vendor,
    pub vendor_model_id: String,
    pub display_name: String,
    pub description: String,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        capability: Capability,
        vendor: Vendor,
        vendor_model_id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            capability,
            vendor,
            vendor_model_id: vendor_model_id.into(),
            display_name: display_name.into(),
            description: description.into(),
        }
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id.clone(),
            name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Public listing entry for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}
