use crate::endpoints::Operation;
use crate::errors::ToolError;
use crate::managers::{
    check_guard, optional_str, or_deleted, require_id, require_org, unknown_tool_error,
    ToolHandler,
};
use crate::services::http::{HttpService, RequestInit};
use crate::services::logger::Logger;
use crate::utils::interpolate::interpolate_path;
use crate::utils::items::{extract_items, pick};
use serde_json::{Map, Value};
use std::sync::Arc;

const TOOLS: &[&str] = &[
    "list_endpoints_simple",
    "list_endpoint_status",
    "get_missing_updates",
    "get_remote_session_status",
    "get_agent_installation_links",
    "inspect_deployer",
    "delete_deployer",
];

/// Convenience reads over the same registry the generic tools use, shaped
/// for quick human consumption (simplified fields, client-side filtering).
pub struct DeviceManager {
    logger: Logger,
    http: Arc<HttpService>,
}

impl DeviceManager {
    pub fn new(logger: Logger, http: Arc<HttpService>) -> Self {
        Self {
            logger: logger.child("devices"),
            http,
        }
    }

    fn resolved_path(
        &self,
        resource: &str,
        op: Operation,
        params: Map<String, Value>,
    ) -> Result<String, ToolError> {
        let descriptor = self.http.spec().require_resource(resource)?;
        let endpoint = descriptor.require(resource, op)?;
        interpolate_path(&endpoint.path, &params)
    }

    fn org_params(&self, args: &Value, context: &str) -> Result<Map<String, Value>, ToolError> {
        let mut params = Map::new();
        params.insert("orgId".to_string(), require_org(args, context)?);
        Ok(params)
    }

    async fn filtered_listing(
        &self,
        args: &Value,
        resource: &str,
        simplify: bool,
    ) -> Result<Value, ToolError> {
        let params = self.org_params(args, resource)?;
        let path = self.resolved_path(resource, Operation::List, params)?;
        let data = self.http.get_with_retry(&path).await?;
        let items = extract_items(&data);

        let shaped: Vec<Value> = if simplify {
            items.iter().map(simplify_endpoint).collect()
        } else {
            items
        };
        let needle = optional_str(args, "query").map(|text| text.to_lowercase());
        let mut filtered: Vec<Value> = match needle {
            Some(needle) => shaped
                .into_iter()
                .filter(|item| {
                    serde_json::to_string(item)
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&needle)
                })
                .collect(),
            None => shaped,
        };
        if let Some(limit) = args.get("limit").and_then(|value| value.as_u64()) {
            filtered.truncate(limit as usize);
        }
        self.logger.debug(
            "listing",
            Some(&serde_json::json!({"resource": resource, "count": filtered.len()})),
        );
        Ok(serde_json::json!({ "items": filtered }))
    }

    async fn get_missing_updates(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = self.org_params(args, "missing updates")?;
        params.insert("endpointId".to_string(), require_id(args, "endpointId")?);
        let path = self.resolved_path("endpoints.missingUpdates", Operation::List, params)?;
        self.http.get_with_retry(&path).await
    }

    async fn get_remote_session_status(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = self.org_params(args, "remote session status")?;
        params.insert("endpointId".to_string(), require_id(args, "endpointId")?);
        params.insert("sessionId".to_string(), require_id(args, "sessionId")?);
        let path = self.resolved_path("endpoints.remoteSessions", Operation::Get, params)?;
        self.http.get_with_retry(&path).await
    }

    async fn get_agent_installation_links(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = self.org_params(args, "agent installation links")?;
        let install_type = optional_str(args, "installType")
            .unwrap_or_else(|| "windowsEXE".to_string());
        params.insert("installType".to_string(), Value::String(install_type));
        let path = self.resolved_path("agent_installation", Operation::Get, params)?;
        self.http.get_with_retry(&path).await
    }

    async fn inspect_deployer(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = self.org_params(args, "deployer inspection")?;
        params.insert("deployerId".to_string(), require_id(args, "deployerId")?);
        let path = self.resolved_path("deployers", Operation::Get, params)?;
        self.http.get_with_retry(&path).await
    }

    async fn delete_deployer(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let mut params = self.org_params(args, "deployer deletion")?;
        params.insert("deployerId".to_string(), require_id(args, "deployerId")?);
        let path = self.resolved_path("deployers", Operation::Delete, params)?;
        if dry_run {
            return Ok(serde_json::json!({"path": path, "dry_run": true}));
        }
        let data = self.http.request(&path, RequestInit::delete()).await?;
        Ok(or_deleted(data))
    }
}

fn simplify_endpoint(item: &Value) -> Value {
    serde_json::json!({
        "id": pick(item, &["id", "endpointId", "uuid", "device_id"]),
        "name": pick(item, &["name", "deviceName", "hostname", "computerName"]),
        "hostname": pick(item, &["hostname", "fqdn", "dnsName"]),
        "os": pick(item, &["os", "osName", "platform"]),
        "groupId": pick(item, &["groupId", "group_id"]),
        "lastSeen": pick(item, &["lastSeen", "last_seen", "lastCheckIn", "last_seen_at"]),
    })
}

#[async_trait::async_trait]
impl ToolHandler for DeviceManager {
    fn tools(&self) -> &'static [&'static str] {
        TOOLS
    }

    async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "list_endpoints_simple" => self.filtered_listing(&args, "endpoints", true).await,
            "list_endpoint_status" => self.filtered_listing(&args, "endpoints_status", false).await,
            "get_missing_updates" => self.get_missing_updates(&args).await,
            "get_remote_session_status" => self.get_remote_session_status(&args).await,
            "get_agent_installation_links" => self.get_agent_installation_links(&args).await,
            "inspect_deployer" => self.inspect_deployer(&args).await,
            "delete_deployer" => self.delete_deployer(&args).await,
            _ => Err(unknown_tool_error("devices", tool)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simplify_endpoint_uses_field_fallbacks() {
        let item = json!({
            "endpointId": "e-1",
            "deviceName": "LAPTOP-7",
            "fqdn": "laptop-7.corp.local",
            "platform": "windows",
            "group_id": 9,
            "last_seen": "2024-11-02T10:00:00Z",
        });
        let out = simplify_endpoint(&item);
        assert_eq!(out["id"], "e-1");
        assert_eq!(out["name"], "LAPTOP-7");
        assert_eq!(out["hostname"], "laptop-7.corp.local");
        assert_eq!(out["os"], "windows");
        assert_eq!(out["groupId"], 9);
        assert_eq!(out["lastSeen"], "2024-11-02T10:00:00Z");
    }
}
