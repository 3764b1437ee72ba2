//! Persistence for generated images.
//!
//! The resolvers only need `save_file(name, bytes, content_type) -> url`.
//! Local disk is built in; cloud buckets plug in by implementing
//! [`StorageProvider`].

pub mod local;

pub use local::LocalStorage;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};

/// Somewhere bytes can be written and later served from a public URL.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Persist `bytes` under `file_name` and return its public URL.
    async fn save_file(&self, file_name: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String>;

    fn public_url(&self, file_name: &str) -> String;
}

/// Build the storage provider named by `storage.kind`.
pub fn from_config(config: &ForgeConfig) -> Result<Arc<dyn StorageProvider>> {
    match config.storage.kind.as_str() {
        "local" => {
            let root = config.storage.local_dir.clone().ok_or_else(|| {
                ForgeError::Configuration(
                    "Local storage selected but STORAGE_LOCAL_DIR is not set".into(),
                )
            })?;
            Ok(Arc::new(LocalStorage::new(
                root,
                config.storage.public_base_url.clone(),
            )))
        }
        other => Err(ForgeError::Configuration(format!(
            "Storage type '{other}' is not available in this build"
        ))),
    }
}

/// `{folder}/{prefix}-{epoch_ms}.{ext}`
pub fn object_name(folder: &str, prefix: &str, epoch_ms: i64, ext: &str) -> String {
    format!(
        "{}/{prefix}-{epoch_ms}.{ext}",
        folder.trim_end_matches('/')
    )
}

/// Replace every non-alphanumeric character with `_`, for use in file names.
pub fn clean_file_text(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    NON_ALNUM
        .get_or_init(|| Regex::new("[^a-zA-Z0-9]").expect("valid file-name pattern"))
        .replace_all(text, "_")
        .into_owned()
}
