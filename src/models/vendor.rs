//! Typed vendor identifiers and alias handling.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// External provider that serves a model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Vendor {
    OpenAi,
    Anthropic,
    Replicate,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [Self::OpenAi, Self::Anthropic, Self::Replicate];

    /// Canonical vendor key string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Replicate => "replicate",
        }
    }

    /// Parse user-facing vendor aliases into a typed vendor.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "replicate" => Some(Self::Replicate),
            _ => None,
        }
    }

    /// Environment variables checked (in order) for this vendor's API key.
    pub const fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["OPENAI_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
            Self::Replicate => &["REPLICATE_API_KEY", "REPLICATE_API_TOKEN"],
        }
    }

    /// Environment variable that disables this vendor when set to `false`.
    pub const fn enable_var(self) -> &'static str {
        match self {
            Self::OpenAi => "USE_OPENAI",
            Self::Anthropic => "USE_ANTHROPIC",
            Self::Replicate => "USE_REPLICATE",
        }
    }

    pub const fn base_url_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::Anthropic => "ANTHROPIC_BASE_URL",
            Self::Replicate => "REPLICATE_BASE_URL",
        }
    }
}
