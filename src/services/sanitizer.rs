use crate::models::{RawResult, SanitizedResult};
use serde_json::{Map, Value};

/// Result keys that are copied into task documents, in output order.
///
/// Only the top-level value of each key is bounded. Strings and lists nested
/// inside an object (for example a structured `msg`) are copied unchanged.
pub const SAFE_KEYS: [&str; 6] = ["stdout", "stderr", "msg", "changed", "rc", "stdout_lines"];
pub const MAX_STRING_CHARS: usize = 5000;
pub const MAX_LIST_ITEMS: usize = 50;
pub const TRUNCATION_MARKER: &str = "... (truncated)";

pub fn sanitize(raw: &RawResult) -> SanitizedResult {
    let mut clean = Map::new();

    for key in SAFE_KEYS {
        let Some(value) = raw.get(key) else {
            continue;
        };
        clean.insert(key.to_string(), bound_value(value));
    }

    SanitizedResult(clean)
}

fn bound_value(value: &Value) -> Value {
    match value {
        // Lengths are counted in chars so multi-byte output never splits a code point.
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            let mut truncated: String = s.chars().take(MAX_STRING_CHARS).collect();
            truncated.push_str(TRUNCATION_MARKER);
            Value::String(truncated)
        }
        Value::Array(items) if items.len() > MAX_LIST_ITEMS => {
            let mut truncated: Vec<Value> = items[..MAX_LIST_ITEMS].to_vec();
            truncated.push(Value::String(TRUNCATION_MARKER.to_string()));
            Value::Array(truncated)
        }
        other => other.clone(),
    }
}
