//! Response extraction: raw VLM text → cleaned [`ExtractedRecord`].
//!
//! Models are asked for a bare JSON object but routinely wrap it in prose or
//! markdown fences. Rather than strip each kind of wrapper, the extractor
//! slices from the first `{` to the last `}` and parses that span strictly.
//!
//! Known limitation: a response holding two independent objects
//! (`{...} and also {...}`) yields a span that is not valid JSON, so the
//! document extracts nothing. That outcome is safe (the orchestrator simply
//! gets an empty record) and is left as is.
//!
//! Cleaning rules, applied to the parsed object:
//! - `null` values are dropped
//! - strings are trimmed; empty results are dropped
//! - nested objects are cleaned with the same rules; if nothing is left the
//!   key is dropped
//! - numbers, booleans and arrays pass through unchanged

use crate::output::ExtractedRecord;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse a model response into a record. Never fails; returns an empty
/// record when no usable JSON object is found.
pub fn extract(raw: &str) -> ExtractedRecord {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        debug!("No JSON object in model output ({} chars)", raw.len());
        return ExtractedRecord::new();
    };
    if end < start {
        debug!("Closing brace precedes opening brace; no JSON object");
        return ExtractedRecord::new();
    }

    let span = &raw[start..=end];
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => clean_object(map),
        Ok(other) => {
            warn!("Model output parsed to a non-object JSON value: {}", type_name(&other));
            ExtractedRecord::new()
        }
        Err(e) => {
            warn!("Failed to parse model output as JSON: {}", e);
            ExtractedRecord::new()
        }
    }
}

fn clean_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter_map(|(key, value)| clean_value(value).map(|v| (key, v)))
        .collect()
}

fn clean_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.len() == s.len() {
                Some(Value::String(s))
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Value::Object(map) => {
            let cleaned = clean_object(map);
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        other => Some(other),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
