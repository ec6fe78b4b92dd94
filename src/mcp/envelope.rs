use crate::utils::redact::redact_object;
use serde_json::Value;

/// Uniform wrapper around a tool result. The result passes through the
/// redaction filter so credentials echoed by the upstream API never cross
/// the transport.
pub fn build_envelope(tool: &str, result: &Value, duration_ms: u64, trace_id: &str) -> Value {
    let success = result
        .get("success")
        .and_then(|value| value.as_bool())
        .unwrap_or(true);
    serde_json::json!({
        "success": success,
        "tool": tool,
        "trace_id": trace_id,
        "duration_ms": duration_ms,
        "result": redact_object(result),
    })
}
