use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const REDACTION: &str = "[REDACTED]";

const SENSITIVE_SUBSTRINGS: &[&str] = &["authorization", "token", "secret", "key", "bearer", "basic"];

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~-]{10,})\b").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(
                r#"\b(password|passwd|token|api[_-]?key|secret|access[_-]?token)\b\s*([:=])\s*([^\s"'`&]+)"#,
            )
            .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_SUBSTRINGS
        .iter()
        .any(|needle| normalized.contains(needle))
}

/// Scrubs inline credential patterns from free text and caps its length.
pub fn redact_text(value: &str, max_chars: usize) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if out.chars().count() > max_chars {
        let truncated: String = out.chars().take(max_chars).collect();
        return format!("{}...", truncated);
    }
    out
}

/// Replaces the value of every credential-like key with a fixed marker,
/// recursively through nested objects and arrays. Sibling keys are untouched.
pub fn redact_object(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(redact_object).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(REDACTION.to_string()));
                } else {
                    out.insert(key.clone(), redact_object(entry));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
