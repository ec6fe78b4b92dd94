pub mod actions;
pub mod devices;
pub mod diagnostics;
pub mod resources;

use crate::errors::ToolError;
use crate::services::config;
use crate::utils::guard::allow_destructive;
use serde_json::Value;

#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool names this handler serves; used for wiring validation.
    fn tools(&self) -> &'static [&'static str];

    async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError>;
}

pub(crate) fn unknown_tool_error(manager: &str, tool: &str) -> ToolError {
    ToolError::internal(format!("Tool \"{}\" is not wired to the {} manager", tool, manager))
}

/// Organization id from the arguments, else the `ORG_ID` default.
pub(crate) fn resolve_org(args: &Value) -> Option<Value> {
    if let Some(org) = args.get("orgId") {
        if !org.is_null() {
            return Some(org.clone());
        }
    }
    config::default_org_id().map(Value::String)
}

pub(crate) fn require_org(args: &Value, context: &str) -> Result<Value, ToolError> {
    resolve_org(args).ok_or_else(|| {
        ToolError::invalid_params(format!(
            "orgId is required for {} (set ORG_ID or pass orgId)",
            context
        ))
    })
}

pub(crate) fn require_str(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(|value| value.as_str())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ToolError::invalid_params(format!("{} must be a non-empty string", key)))
}

pub(crate) fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|value| value.as_str())
        .map(|text| text.to_string())
}

/// A string-or-number identifier argument.
pub(crate) fn require_id(args: &Value, key: &str) -> Result<Value, ToolError> {
    match args.get(key) {
        Some(value) if value.is_string() || value.is_number() => Ok(value.clone()),
        _ => Err(ToolError::invalid_params(format!(
            "{} must be a string or number",
            key
        ))),
    }
}

pub(crate) fn optional_id(args: &Value, key: &str) -> Option<Value> {
    args.get(key)
        .filter(|value| value.is_string() || value.is_number())
        .cloned()
}

pub(crate) fn flag(args: &Value, key: &str) -> bool {
    args.get(key).and_then(|value| value.as_bool()).unwrap_or(false)
}

pub(crate) fn string_list(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(|value| value.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|text| text.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn id_list(args: &Value, key: &str) -> Vec<Value> {
    args.get(key)
        .and_then(|value| value.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_string() || item.is_number())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Runs the destructive gate over the call arguments. Returns the dry-run
/// flag on success so the caller can branch; denial is a typed error raised
/// before any network traffic.
pub(crate) fn check_guard(args: &Value) -> Result<bool, ToolError> {
    let dry_run = flag(args, "dry_run");
    let confirm = args.get("confirm").and_then(|value| value.as_str());
    let decision = allow_destructive(confirm, dry_run, config::destructive_enabled());
    if !decision.allowed {
        return Err(ToolError::confirmation_denied(
            decision
                .reason
                .unwrap_or_else(|| "Destructive operation denied".to_string()),
        ));
    }
    Ok(dry_run)
}

/// DELETE responses are frequently empty; report success explicitly.
pub(crate) fn or_deleted(data: Value) -> Value {
    let empty = match &data {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        serde_json::json!({ "deleted": true })
    } else {
        data
    }
}
