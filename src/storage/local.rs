//! Local-disk storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::{ForgeError, Result};

use super::StorageProvider;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_path(&self, file_name: &str) -> Result<PathBuf> {
        let relative = Path::new(file_name.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ForgeError::InvalidArgument(format!(
                "file name '{file_name}' must be a relative path without '..'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn save_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let path = self.target_path(file_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), content_type, size = bytes.len(), "Stored file");
        Ok(self.public_url(file_name))
    }

    fn public_url(&self, file_name: &str) -> String {
        let file = file_name.trim_start_matches('/');
        match &self.public_base_url {
            Some(base) => format!("{}/{file}", base.trim_end_matches('/')),
            None => format!("/files/{file}"),
        }
    }
}
