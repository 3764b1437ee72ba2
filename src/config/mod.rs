//! Configuration (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};
use crate::generation::TemperatureLadder;
use crate::models::Vendor;

/// Stock stepdown ladder. Kept as configuration, not derived.
pub const DEFAULT_TEMPERATURE_LADDER: [f64; 7] = [1.5, 1.3, 1.1, 1.0, 0.9, 0.75, 0.6];

/// Storage folder images are written under.
pub const DEFAULT_IMAGE_FOLDER: &str = "fcb";

pub const MAX_TEMPERATURE: f64 = 2.0;

/// Settings for one vendor adapter.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VendorSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// `Some(false)` disables the vendor even when a key is present.
    pub enabled: Option<bool>,
}

impl fmt::Debug for VendorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl VendorSettings {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VendorTable {
    pub openai: VendorSettings,
    pub anthropic: VendorSettings,
    pub replicate: VendorSettings,
}

impl VendorTable {
    pub fn get(&self, vendor: Vendor) -> &VendorSettings {
        match vendor {
            Vendor::OpenAi => &self.openai,
            Vendor::Anthropic => &self.anthropic,
            Vendor::Replicate => &self.replicate,
        }
    }

    pub fn get_mut(&mut self, vendor: Vendor) -> &mut VendorSettings {
        match vendor {
            Vendor::OpenAi => &mut self.openai,
            Vendor::Anthropic => &mut self.anthropic,
            Vendor::Replicate => &mut self.replicate,
        }
    }
}

/// Where generated images are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage backend name; `local` is built in.
    pub kind: String,
    pub local_dir: Option<PathBuf>,
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            kind: "local".to_string(),
            local_dir: None,
            public_base_url: None,
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForgeConfig {
    pub vendors: VendorTable,
    pub default_text_model: Option<String>,
    pub default_image_model: Option<String>,
    pub temperature_ladder: Vec<f64>,
    /// Per-attempt vendor timeout. `None` waits indefinitely.
    pub attempt_timeout_ms: Option<u64>,
    pub image_folder: String,
    pub storage: StorageSettings,
    /// Log raw vendor output at debug level.
    pub debug_raw_responses: bool,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            vendors: VendorTable::default(),
            default_text_model: None,
            default_image_model: None,
            temperature_ladder: DEFAULT_TEMPERATURE_LADDER.to_vec(),
            attempt_timeout_ms: None,
            image_folder: DEFAULT_IMAGE_FOLDER.to_string(),
            storage: StorageSettings::default(),
            debug_raw_responses: false,
        }
    }
}

impl ForgeConfig {
    /// Load from environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML settings. Secrets are usually left to the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| ForgeError::Configuration(format!("Invalid config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file and overlay the environment on top.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ForgeError::Configuration(format!("Cannot read config {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&raw)
            .map_err(|e| ForgeError::Configuration(format!("Invalid config TOML: {e}")))?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for vendor in Vendor::ALL {
            let settings = self.vendors.get_mut(vendor);
            if let Some(key) = vendor.api_key_vars().iter().find_map(|var| lookup(*var)) {
                settings.api_key = Some(key);
            }
            if let Some(url) = lookup(vendor.base_url_var()) {
                settings.base_url = Some(url);
            }
            if let Some(flag) = lookup(vendor.enable_var()) {
                settings.enabled = Some(flag.trim() != "false");
            }
        }

        if let Some(id) = lookup("LOREFORGE_DEFAULT_TEXT_MODEL") {
            self.default_text_model = Some(id);
        }
        if let Some(id) = lookup("LOREFORGE_DEFAULT_IMAGE_MODEL") {
            self.default_image_model = Some(id);
        }
        if let Some(raw) = lookup("LOREFORGE_TEMPERATURE_LADDER") {
            self.temperature_ladder = parse_ladder(&raw)?;
        }
        if let Some(raw) = lookup("LOREFORGE_ATTEMPT_TIMEOUT_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                ForgeError::Configuration(format!("Invalid LOREFORGE_ATTEMPT_TIMEOUT_MS '{raw}'"))
            })?;
            self.attempt_timeout_ms = (millis > 0).then_some(millis);
        }
        if let Some(folder) = lookup("LOREFORGE_IMAGE_FOLDER") {
            self.image_folder = folder;
        }
        if let Some(kind) = lookup("STORAGE_TYPE") {
            self.storage.kind = kind.to_ascii_lowercase();
        }
        if let Some(dir) = lookup("STORAGE_LOCAL_DIR") {
            self.storage.local_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = Some(url);
        }
        if let Some(flag) = lookup("DEBUG") {
            self.debug_raw_responses = flag.trim() == "true";
        }
        Ok(())
    }

    /// Reject settings the resolvers cannot run with.
    pub fn validate(&self) -> Result<()> {
        TemperatureLadder::new(self.temperature_ladder.clone())?;
        if self.image_folder.trim().is_empty() {
            return Err(ForgeError::Configuration("image_folder must not be empty".into()));
        }
        Ok(())
    }

    pub fn vendor(&self, vendor: Vendor) -> &VendorSettings {
        self.vendors.get(vendor)
    }

    pub fn set_api_key(&mut self, vendor: Vendor, key: impl Into<String>) {
        self.vendors.get_mut(vendor).api_key = Some(key.into());
    }

    pub fn set_base_url(&mut self, vendor: Vendor, url: impl Into<String>) {
        self.vendors.get_mut(vendor).base_url = Some(url.into());
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_ladder(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                ForgeError::Configuration(format!("Invalid temperature '{s}' in ladder"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        let config = ForgeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.temperature_ladder, DEFAULT_TEMPERATURE_LADDER.to_vec());
        assert_eq!(config.attempt_timeout(), None);
        assert_eq!(config.image_folder, "fcb");
    }

    #[test]
    fn env_overlay_sets_keys_and_flags() {
        let mut config = ForgeConfig::default();
        config
            .apply_vars(vars(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("REPLICATE_API_TOKEN", "r8-token"),
                ("USE_ANTHROPIC", "false"),
                ("LOREFORGE_ATTEMPT_TIMEOUT_MS", "2500"),
                ("STORAGE_TYPE", "LOCAL"),
                ("DEBUG", "true"),
            ]))
            .unwrap();

        assert_eq!(config.vendor(Vendor::OpenAi).api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vendor(Vendor::Replicate).api_key.as_deref(), Some("r8-token"));
        assert!(!config.vendor(Vendor::Anthropic).is_enabled());
        assert!(config.vendor(Vendor::OpenAi).is_enabled());
        assert_eq!(config.attempt_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.storage.kind, "local");
        assert!(config.debug_raw_responses);
    }

    #[test]
    fn replicate_prefers_primary_key_var() {
        let mut config = ForgeConfig::default();
        config
            .apply_vars(vars(&[
                ("REPLICATE_API_KEY", "primary"),
                ("REPLICATE_API_TOKEN", "alias"),
            ]))
            .unwrap();
        assert_eq!(config.vendor(Vendor::Replicate).api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn ladder_from_env_is_validated() {
        let mut config = ForgeConfig::default();
        config
            .apply_vars(vars(&[("LOREFORGE_TEMPERATURE_LADDER", "1.2, 0.8,0.4")]))
            .unwrap();
        assert_eq!(config.temperature_ladder, vec![1.2, 0.8, 0.4]);
        config.validate().unwrap();

        let mut bad = ForgeConfig::default();
        bad.apply_vars(vars(&[("LOREFORGE_TEMPERATURE_LADDER", "0.5,0.9")]))
            .unwrap();
        assert!(bad.validate().is_err());

        let mut junk = ForgeConfig::default();
        assert!(junk
            .apply_vars(vars(&[("LOREFORGE_TEMPERATURE_LADDER", "hot,cold")]))
            .is_err());
    }

    #[test]
    fn toml_settings_parse() {
        let config = ForgeConfig::from_toml_str(
            r#"
            default_text_model = "Claude_3_haiku"
            temperature_ladder = [1.0, 0.5]
            attempt_timeout_ms = 30000

            [vendors.openai]
            base_url = "http://localhost:9999/v1"
            enabled = false

            [storage]
            kind = "local"
            local_dir = "/tmp/images"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_text_model.as_deref(), Some("Claude_3_haiku"));
        assert_eq!(config.temperature_ladder, vec![1.0, 0.5]);
        assert!(!config.vendor(Vendor::OpenAi).is_enabled());
        assert_eq!(
            config.vendor(Vendor::OpenAi).base_url.as_deref(),
            Some("http://localhost:9999/v1")
        );
        assert_eq!(config.storage.local_dir, Some(PathBuf::from("/tmp/images")));
        assert_eq!(config.image_folder, "fcb");
    }

    #[test]
    fn out_of_range_ladder_rejected() {
        let err = ForgeConfig::from_toml_str("temperature_ladder = [2.5, 1.0]").unwrap_err();
        assert!(matches!(err, ForgeError::Configuration(msg) if msg.contains("outside")));
    }

    #[test]
    fn debug_redacts_api_keys() {
        let mut config = ForgeConfig::default();
        config.set_api_key(Vendor::Anthropic, "sk-ant-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
