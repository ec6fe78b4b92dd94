use crate::constants::limits;
use crate::endpoints::Operation;
use crate::errors::ToolError;
use crate::managers::{resolve_org, unknown_tool_error, ToolHandler};
use crate::services::config;
use crate::services::http::HttpService;
use crate::services::logger::Logger;
use crate::utils::interpolate::interpolate_path;
use crate::utils::items::extract_items;
use serde_json::{Map, Value};
use std::sync::Arc;

const TOOLS: &[&str] = &["diagnose_config", "verify_auth", "audit_endpoints"];

/// Probes used by `audit_endpoints`: label plus registry coordinates.
const ORG_PROBES: &[(&str, &str, Operation)] = &[
    ("endpoints:managed:list", "endpoints", Operation::List),
    ("endpoint_groups:list", "endpoint_groups", Operation::List),
    ("endpoints:status:list", "endpoints_status", Operation::List),
    ("deployers:list", "deployers", Operation::List),
    ("agent_deployment:get", "agent_deployment", Operation::Get),
    ("search:list", "search", Operation::List),
    (
        "deployer_installation:windowsEXE",
        "deployer_installation_windows",
        Operation::List,
    ),
];

pub struct DiagnosticsManager {
    logger: Logger,
    http: Arc<HttpService>,
}

impl DiagnosticsManager {
    pub fn new(logger: Logger, http: Arc<HttpService>) -> Self {
        Self {
            logger: logger.child("diagnostics"),
            http,
        }
    }

    /// Configuration snapshot with no secret material.
    fn diagnose_config(&self) -> Result<Value, ToolError> {
        let credential = config::static_token();
        Ok(serde_json::json!({
            "base_url": self.http.resolve_base_url(),
            "auth_scheme": self.http.spec().auth.scheme.as_str(),
            "has_credential": credential.is_some(),
            "credential_source": credential.map(|(_, source)| source),
            "has_client_credentials": config::client_credentials().is_some(),
            "cached_credential_age_ms": self.http.token_cache().age_ms().map(|age| age as u64),
            "has_default_org": config::default_org_id().is_some(),
            "allow_destructive": config::destructive_enabled(),
        }))
    }

    /// Probes a low-risk GET and classifies the outcome instead of erroring,
    /// so a broken credential still produces a readable payload.
    async fn verify_auth(&self) -> Result<Value, ToolError> {
        match self.http.get_with_retry("/organizations").await {
            Ok(data) => Ok(serde_json::json!({"ok": true, "sample": data})),
            Err(err) => {
                let status = err.http_status();
                let reason = match status {
                    Some(401) | Some(403) => "auth_failed",
                    _ => "http_error",
                };
                Ok(serde_json::json!({
                    "ok": false,
                    "reason": reason,
                    "status": status,
                    "error": err.message,
                }))
            }
        }
    }

    async fn probe(&self, path: &str, limit: usize) -> Value {
        match self.http.get_with_retry(path).await {
            Ok(data) => {
                let items = extract_items(&data);
                let sample: Vec<Value> = items.iter().take(limit).cloned().collect();
                serde_json::json!({
                    "ok": true,
                    "count": items.len(),
                    "sample": if sample.is_empty() { data } else { Value::Array(sample) },
                })
            }
            Err(err) => serde_json::json!({
                "ok": false,
                "status": err.http_status(),
                "error": err.message,
                "snippet": err.details.as_ref().and_then(|d| d.get("snippet")).cloned(),
            }),
        }
    }

    async fn audit_endpoints(&self, args: &Value) -> Result<Value, ToolError> {
        let limit = args
            .get("limit")
            .and_then(|value| value.as_u64())
            .unwrap_or(limits::AUDIT_SAMPLE_LIMIT as u64) as usize;
        let org = resolve_org(args);

        let mut results = Map::new();
        results.insert(
            "organizations:list".to_string(),
            self.probe("/organizations", limit).await,
        );

        match org {
            Some(org) => {
                for (label, resource, op) in ORG_PROBES {
                    let Some(endpoint) = self
                        .http
                        .spec()
                        .resource(resource)
                        .and_then(|descriptor| descriptor.operation(*op))
                    else {
                        continue;
                    };
                    let mut params = Map::new();
                    params.insert("orgId".to_string(), org.clone());
                    match interpolate_path(&endpoint.path, &params) {
                        Ok(path) => {
                            results.insert(label.to_string(), self.probe(&path, limit).await);
                        }
                        Err(err) => {
                            results.insert(
                                label.to_string(),
                                serde_json::json!({"ok": false, "error": err.message}),
                            );
                        }
                    }
                }
            }
            None => {
                results.insert(
                    "note".to_string(),
                    Value::String("No orgId provided; set ORG_ID env or pass orgId.".to_string()),
                );
            }
        }

        self.logger.info(
            "endpoint audit finished",
            Some(&serde_json::json!({"probes": results.len()})),
        );
        Ok(serde_json::json!({
            "audited_at": chrono::Utc::now().to_rfc3339(),
            "results": results,
        }))
    }
}

#[async_trait::async_trait]
impl ToolHandler for DiagnosticsManager {
    fn tools(&self) -> &'static [&'static str] {
        TOOLS
    }

    async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "diagnose_config" => self.diagnose_config(),
            "verify_auth" => self.verify_auth().await,
            "audit_endpoints" => self.audit_endpoints(&args).await,
            _ => Err(unknown_tool_error("diagnostics", tool)),
        }
    }
}
