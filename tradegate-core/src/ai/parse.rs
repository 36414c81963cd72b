//! Strict decision parsing. Every failure maps to a DENY with `INVALID_RESPONSE`.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{AiDecision, Decision};

pub const NOT_JSON: &str = "model_response_not_json";
pub const NOT_OBJECT: &str = "model_response_json_not_object";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDecision {
    decision: Decision,
    confidence: f64,
    #[serde(default)]
    risk_flags: Vec<String>,
    #[serde(default)]
    key_reasons: Vec<String>,
}

/// Validate an already-decoded JSON value against the decision schema.
pub fn parse_strict(value: Value) -> AiDecision {
    let raw: RawDecision = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => return AiDecision::deny_default(format!("schema_validation_error: {e}")),
    };
    if !(0.0..=1.0).contains(&raw.confidence) {
        return AiDecision::deny_default(
            "schema_validation_error: confidence must be within [0, 1]",
        );
    }
    AiDecision::new(raw.decision, raw.confidence, raw.risk_flags, raw.key_reasons)
}

/// Parse free-form model output: bare JSON, a fenced block, or the outermost brace span.
pub fn parse_response_text(text: &str) -> AiDecision {
    match extract_json_object(text) {
        Ok(value) => parse_strict(value),
        Err(reason) => AiDecision::deny_default(reason),
    }
}

fn extract_json_object(text: &str) -> Result<Value, String> {
    let stripped = text.trim();
    if stripped.starts_with('{') && stripped.ends_with('}') {
        return decode_object(stripped);
    }
    if let Some(inner) = fenced_object(stripped) {
        return decode_object(inner);
    }
    if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
        if start < end {
            return decode_object(&stripped[start..=end]);
        }
    }
    Err(NOT_JSON.to_string())
}

/// Body of the first ```/```json fence, if it holds a brace-delimited object.
fn fenced_object(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let close = after.find("```")?;
    let inner = after[..close].trim();
    (inner.starts_with('{') && inner.ends_with('}')).then_some(inner)
}

fn decode_object(candidate: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(NOT_OBJECT.to_string()),
        Err(e) => Err(format!("model_response_invalid_json: {e}")),
    }
}
