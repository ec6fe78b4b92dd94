use crate::constants::retry;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Denied,
    NotFound,
    Timeout,
    Retryable,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Retryable),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Denied, "DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Retryable, "RETRYABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    /// A path template placeholder had no value in the parameter mapping.
    pub fn missing_parameter(key: &str) -> Self {
        Self::new(
            ToolErrorKind::InvalidParams,
            "MISSING_PARAMETER",
            format!("Missing path parameter: {}", key),
        )
        .with_details(serde_json::json!({ "parameter": key }))
    }

    /// Upstream returned a non-2xx status; `snippet` is capped by the caller.
    pub fn http_error(status: u16, status_text: &str, snippet: &str) -> Self {
        let kind = if retry::STATUS_CODES.contains(&status) {
            ToolErrorKind::Retryable
        } else if status == 404 {
            ToolErrorKind::NotFound
        } else if status == 401 || status == 403 {
            ToolErrorKind::Denied
        } else {
            ToolErrorKind::Internal
        };
        let message = if status_text.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {} {}", status, status_text)
        };
        Self::new(kind, "HTTP_ERROR", message).with_details(serde_json::json!({
            "status": status,
            "snippet": snippet,
        }))
    }

    /// Status code carried by an `HTTP_ERROR`, if this is one.
    pub fn http_status(&self) -> Option<u16> {
        if self.code != "HTTP_ERROR" {
            return None;
        }
        self.details
            .as_ref()?
            .get("status")?
            .as_u64()
            .map(|status| status as u16)
    }

    pub fn response_parse(status: u16, snippet: &str) -> Self {
        Self::new(
            ToolErrorKind::Internal,
            "RESPONSE_PARSE",
            "Failed to parse JSON response",
        )
        .with_details(serde_json::json!({
            "status": status,
            "snippet": snippet,
        }))
    }

    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "UNSUPPORTED_OPERATION", message)
    }

    pub fn confirmation_denied(reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Denied, "CONFIRMATION_DENIED", reason)
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "RESOLUTION_FAILED", message)
    }

    pub fn poll_timeout(last: Value) -> Self {
        Self::new(
            ToolErrorKind::Timeout,
            "POLL_TIMEOUT",
            "Polling timeout exceeded",
        )
        .with_details(serde_json::json!({ "data": last }))
    }

    pub fn poll_failure(status: &str, last: Value) -> Self {
        Self::new(
            ToolErrorKind::Internal,
            "POLL_FAILED",
            format!("Job failed with status={}", status),
        )
        .with_details(serde_json::json!({
            "status": status,
            "data": last,
        }))
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}
