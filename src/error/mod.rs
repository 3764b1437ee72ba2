//! Error types for loreforge.

pub mod unified;

pub use unified::{ContractViolation, ErrorCategory, ImageStage, ViolationReason};

use thiserror::Error;

use crate::models::{Capability, Vendor};

/// Primary error type for all resolver operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Unknown {capability} model: {model_id}")]
    UnknownModel {
        capability: Capability,
        model_id: String,
    },

    #[error("{vendor} adapter unavailable: {reason}")]
    AdapterInit { vendor: Vendor, reason: String },

    #[error("{vendor} call failed{}: {message}", status_suffix(.status))]
    VendorCall {
        vendor: Vendor,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    ContractViolation(Box<ContractViolation>),

    #[error("Failed to generate image ({stage}): {message}")]
    ImageGeneration {
        stage: ImageStage,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{vendor} call timed out after {millis}ms")]
    Timeout { vendor: Vendor, millis: u64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    /// Create a vendor call error from an HTTP status and response body.
    pub fn vendor_status(vendor: Vendor, status: u16, body: impl Into<String>) -> Self {
        Self::VendorCall {
            vendor,
            status: Some(status),
            message: body.into(),
            source: None,
        }
    }

    /// Create a vendor call error wrapping a transport failure.
    pub fn vendor_transport(vendor: Vendor, err: reqwest::Error) -> Self {
        Self::VendorCall {
            vendor,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create an image pipeline error for the given stage.
    pub fn image(stage: ImageStage, message: impl Into<String>) -> Self {
        Self::ImageGeneration {
            stage,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any error as an image pipeline failure, keeping its message.
    ///
    /// Errors that are already image pipeline failures pass through untouched.
    pub fn into_image_error(self, stage: ImageStage) -> Self {
        match self {
            Self::ImageGeneration { .. } => self,
            other => Self::ImageGeneration {
                stage,
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownModel { .. } | Self::AdapterInit { .. } | Self::Configuration(_) => {
                ErrorCategory::Configuration
            }
            Self::VendorCall { .. } | Self::Timeout { .. } => ErrorCategory::Transport,
            Self::ContractViolation(_) | Self::Serialization(_) => ErrorCategory::Contract,
            Self::ImageGeneration { .. } | Self::Io(_) => ErrorCategory::ImagePipeline,
            Self::InvalidArgument(_) => ErrorCategory::InvalidInput,
        }
    }

    /// Whether the stepdown ladder may try another temperature after this error.
    ///
    /// Only contract failures qualify; transport failures always propagate.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Contract)
    }

    /// Status code the HTTP layer is expected to map this error onto.
    pub fn http_status_hint(&self) -> u16 {
        match self {
            Self::UnknownModel { .. } | Self::InvalidArgument(_) => 400,
            _ => self.category().http_status_hint(),
        }
    }

    /// The contract violation details, if this is one.
    pub fn as_contract_violation(&self) -> Option<&ContractViolation> {
        match self {
            Self::ContractViolation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<ContractViolation> for ForgeError {
    fn from(v: ContractViolation) -> Self {
        Self::ContractViolation(Box::new(v))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ForgeError>;
