pub mod guard;
pub mod interpolate;
pub mod items;
pub mod qs;
pub mod redact;

use serde_json::Value;

/// String form of a scalar value the way it appears in a URL: strings pass
/// through unquoted, everything else renders as its JSON text.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
