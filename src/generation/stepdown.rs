//! Temperature stepdown ladder and structured-output parsing.

use serde_json::Value;

use crate::config::{DEFAULT_TEMPERATURE_LADDER, MAX_TEMPERATURE};
use crate::error::{ForgeError, Result};

/// Descending fallback temperatures tried after the caller's own value.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureLadder {
    rungs: Vec<f64>,
}

impl Default for TemperatureLadder {
    fn default() -> Self {
        Self {
            rungs: DEFAULT_TEMPERATURE_LADDER.to_vec(),
        }
    }
}

impl TemperatureLadder {
    /// Build a ladder; rungs must be non-empty, within `[0, 2]`, and
    /// strictly descending.
    pub fn new(rungs: Vec<f64>) -> Result<Self> {
        if rungs.is_empty() {
            return Err(ForgeError::Configuration(
                "temperature_ladder must not be empty".into(),
            ));
        }
        if let Some(t) = rungs.iter().find(|t| !in_range(**t)) {
            return Err(ForgeError::Configuration(format!(
                "temperature_ladder value {t} is outside [0, {MAX_TEMPERATURE}]"
            )));
        }
        if rungs.windows(2).any(|w| w[1] >= w[0]) {
            return Err(ForgeError::Configuration(
                "temperature_ladder must be strictly descending".into(),
            ));
        }
        Ok(Self { rungs })
    }

    pub fn rungs(&self) -> &[f64] {
        &self.rungs
    }

    /// Temperatures to try, in order: the requested value, then every rung
    /// strictly below it.
    pub fn candidates(&self, requested: f64) -> Result<Vec<f64>> {
        if !in_range(requested) {
            return Err(ForgeError::InvalidArgument(format!(
                "temperature {requested} is outside [0, {MAX_TEMPERATURE}]"
            )));
        }
        let mut out = Vec::with_capacity(self.rungs.len() + 1);
        out.push(requested);
        out.extend(self.rungs.iter().copied().filter(|rung| *rung < requested));
        Ok(out)
    }
}

fn in_range(t: f64) -> bool {
    (0.0..=MAX_TEMPERATURE).contains(&t)
}

/// Strip one outer markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line; anything else is content.
    let body = match rest.split_once('\n') {
        Some((info, body)) if is_info_string(info) => body,
        _ => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse vendor output as a JSON object or array.
///
/// A JSON string literal whose contents are themselves JSON is decoded a
/// second time. Scalars are not structured data and yield `None`.
pub fn parse_structured(raw: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let value = match value {
        Value::String(inner) => serde_json::from_str(strip_code_fence(&inner)).ok()?,
        other => other,
    };
    matches!(value, Value::Object(_) | Value::Array(_)).then_some(value)
}

/// Short name of a JSON value's type, for shape-mismatch diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn candidates_start_with_requested_then_lower_rungs() {
        let ladder = TemperatureLadder::default();
        assert_eq!(ladder.candidates(1.0).unwrap(), vec![1.0, 0.9, 0.75, 0.6]);
        assert_eq!(
            ladder.candidates(2.0).unwrap(),
            vec![2.0, 1.5, 1.3, 1.1, 1.0, 0.9, 0.75, 0.6]
        );
    }

    #[test]
    fn below_lowest_rung_is_single_attempt() {
        let ladder = TemperatureLadder::default();
        assert_eq!(ladder.candidates(0.5).unwrap(), vec![0.5]);
        assert_eq!(ladder.candidates(0.6).unwrap(), vec![0.6]);
    }

    #[test]
    fn candidates_are_strictly_decreasing_after_first() {
        let ladder = TemperatureLadder::default();
        for requested in [0.0, 0.65, 0.9, 1.05, 1.2, 1.4, 1.5, 1.75, 2.0] {
            let candidates = ladder.candidates(requested).unwrap();
            assert_eq!(candidates[0], requested);
            for pair in candidates[1..].windows(2) {
                assert!(pair[1] < pair[0], "{candidates:?}");
            }
            for t in &candidates[1..] {
                assert!(*t < requested);
                assert!(DEFAULT_TEMPERATURE_LADDER.contains(t));
            }
        }
    }

    #[test]
    fn out_of_range_temperature_is_invalid() {
        let ladder = TemperatureLadder::default();
        assert!(matches!(ladder.candidates(2.5), Err(ForgeError::InvalidArgument(_))));
        assert!(matches!(ladder.candidates(-0.1), Err(ForgeError::InvalidArgument(_))));
        assert!(matches!(ladder.candidates(f64::NAN), Err(ForgeError::InvalidArgument(_))));
    }

    #[test]
    fn ladder_must_descend() {
        assert!(TemperatureLadder::new(vec![]).is_err());
        assert!(TemperatureLadder::new(vec![0.5, 0.9]).is_err());
        assert!(TemperatureLadder::new(vec![0.9, 0.9]).is_err());
        assert!(TemperatureLadder::new(vec![3.0, 1.0]).is_err());
        assert_eq!(TemperatureLadder::new(vec![1.2, 0.4]).unwrap().rungs(), &[1.2, 0.4]);
    }

    #[test]
    fn parses_plain_object_and_array() {
        assert_eq!(parse_structured(r#"{"k":"v"}"#), Some(json!({"k": "v"})));
        assert_eq!(parse_structured("[1, 2]"), Some(json!([1, 2])));
    }

    #[test]
    fn parses_double_encoded_json() {
        assert_eq!(parse_structured(r#""{\"k\":\"v\"}""#), Some(json!({"k": "v"})));
    }

    #[test]
    fn strips_outer_code_fence() {
        let raw = "```json\n{\"name\": \"Ashford\"}\n```";
        assert_eq!(parse_structured(raw), Some(json!({"name": "Ashford"})));
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn fence_opening_line_with_content_is_not_an_info_string() {
        let raw = "```{\"name\":\"Ashford\"}\n```";
        assert_eq!(parse_structured(raw), Some(json!({"name": "Ashford"})));
        assert_eq!(strip_code_fence("```[1, 2]```"), "[1, 2]");
        assert_eq!(strip_code_fence("```json-5\n{}\n```"), "{}");
    }

    #[test]
    fn rejects_commentary_and_scalars() {
        assert_eq!(parse_structured("Sure! Here is your JSON: {\"k\":1}"), None);
        assert_eq!(parse_structured("42"), None);
        assert_eq!(parse_structured(r#""just text""#), None);
        assert_eq!(parse_structured(""), None);
    }

    #[test]
    fn json_kind_names() {
        assert_eq!(json_kind(&json!([])), "array");
        assert_eq!(json_kind(&json!({})), "object");
        assert_eq!(json_kind(&json!(null)), "null");
    }
}
