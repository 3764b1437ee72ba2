//! Error classification and diagnostic payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unknown model ids, missing or disabled credentials, bad settings.
    Configuration,
    /// Network, auth, rate-limit and timeout failures from a vendor.
    Transport,
    /// The vendor never produced output matching the requested shape.
    Contract,
    /// A failed step of the image pipeline.
    ImagePipeline,
    InvalidInput,
}

impl ErrorCategory {
    pub fn http_status_hint(self) -> u16 {
        match self {
            Self::Configuration => 500,
            Self::Transport => 503,
            Self::Contract => 500,
            Self::ImagePipeline => 500,
            Self::InvalidInput => 400,
        }
    }
}

/// Which step of the image pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageStage {
    VendorCall,
    Fetch,
    Storage,
}

/// Why the final attempt of a ladder was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    /// The vendor returned no usable content.
    Empty,
    /// No attempt produced parseable output.
    Unparseable,
    /// Output parsed but had the wrong shape.
    ShapeMismatch { expected: String, actual: String },
}

/// Diagnostics for a completion that exhausted its temperature ladder.
///
/// Intended for operators. Callers exposing errors to end users should use
/// the `Display` form, which omits prompts and raw vendor text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractViolation {
    pub system_text: String,
    pub user_text: String,
    pub temperatures: Vec<f64>,
    pub last_raw: Option<String>,
    pub reason: ViolationReason,
}

impl ContractViolation {
    pub fn attempts(&self) -> usize {
        self.temperatures.len()
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ViolationReason::Empty => write!(
                f,
                "Vendor returned no usable content after {} attempt(s) at temperatures {:?}",
                self.attempts(),
                self.temperatures
            ),
            ViolationReason::Unparseable => write!(
                f,
                "Vendor output was not valid structured data after {} attempt(s) at temperatures {:?}",
                self.attempts(),
                self.temperatures
            ),
            ViolationReason::ShapeMismatch { expected, actual } => write!(
                f,
                "Vendor output had the wrong shape after {} attempt(s) at temperatures {:?}: expected {expected}, got {actual}",
                self.attempts(),
                self.temperatures
            ),
        }
    }
}
