use crate::utils::scalar_to_string;
use serde_json::{Map, Value};

/// Serializes a flat parameter map to a query string with a leading `?`, or
/// an empty string when nothing survives. Null and blank-string values are
/// dropped, arrays expand to one pair per item in order, and nested objects
/// collapse to their percent-encoded JSON text.
pub fn qs(params: &Map<String, Value>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (key, value) in params.iter() {
        match value {
            Value::Null => continue,
            Value::String(text) if text.trim().is_empty() => continue,
            Value::Array(items) => {
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    parts.push(pair(key, &scalar_to_string(item)));
                }
            }
            Value::Object(_) => {
                let rendered = serde_json::to_string(value).unwrap_or_default();
                parts.push(pair(key, &rendered));
            }
            other => parts.push(pair(key, &scalar_to_string(other))),
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}
