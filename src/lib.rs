//! Loreforge: provider-agnostic completion and image resolution.
//!
//! A [`ModelRegistry`](models::ModelRegistry) maps stable model ids onto a
//! vendor and the vendor's own model string. The
//! [`CompletionResolver`](generation::CompletionResolver) calls the selected
//! text vendor and enforces a structured output contract, stepping the
//! sampling temperature down until the answer parses. The
//! [`ImageResolver`](generation::ImageResolver) generates an image, stores
//! it, and returns its public URL.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use loreforge::prelude::*;
//!
//! # async fn example() -> loreforge::error::Result<()> {
//! let config = ForgeConfig::from_env()?;
//! let registry = Arc::new(ModelRegistry::with_defaults(
//!     config.default_text_model.as_deref(),
//!     config.default_image_model.as_deref(),
//! )?);
//! let resolver = CompletionResolver::new(registry, AdapterSet::from_config(&config), &config)?;
//!
//! let request = CompletionRequest::builder()
//!     .system_text("You describe taverns. Answer with {\"name\", \"description\"}.")
//!     .user_text("A tavern in a rainy port town")
//!     .temperature(1.1)
//!     .build();
//! let tavern = resolver.complete(&request).await?;
//! println!("{tavern}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod storage;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
