//! Convenience re-exports for common use.

pub use crate::config::ForgeConfig;
pub use crate::error::{ForgeError, Result};
pub use crate::generation::{
    CompletionRequest, CompletionResolver, ImageRequest, ImageResolver, ImageResult,
    PreviewExample, PreviewRequest,
};
pub use crate::models::{Capability, ModelDescriptor, ModelRegistry, ModelSummary, Vendor};
pub use crate::provider::{AdapterSet, ImageAdapter, ImageOptions, TextAdapter, TextCall};
pub use crate::storage::{LocalStorage, StorageProvider};
