use crate::errors::ToolError;
use crate::managers::{
    check_guard, id_list, require_id, require_org, require_str, unknown_tool_error, ToolHandler,
};
use crate::services::http::{HttpService, RequestInit};
use crate::services::logger::Logger;
use crate::services::poll::{poll_job, PollOptions};
use crate::utils::interpolate::interpolate_path;
use serde_json::{Map, Value};
use std::sync::Arc;

const TOOLS: &[&str] = &[
    "call_action",
    "start_remote_session",
    "move_endpoint_simple",
    "modify_group_contents",
];

/// Named POST-only operations from the registry, plus the convenience
/// wrappers the original tool surface exposes for the common ones.
pub struct ActionManager {
    logger: Logger,
    http: Arc<HttpService>,
}

impl ActionManager {
    pub fn new(logger: Logger, http: Arc<HttpService>) -> Self {
        Self {
            logger: logger.child("actions"),
            http,
        }
    }

    fn action_path(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let action = self.http.spec().require_action(name)?;
        let mut params = Map::new();
        if action.path.contains("{orgId}") {
            params.insert(
                "orgId".to_string(),
                require_org(args, &format!("action \"{}\"", name))?,
            );
        }
        if action.path.contains("{endpointId}") {
            params.insert("endpointId".to_string(), require_id(args, "endpointId")?);
        }
        interpolate_path(&action.path, &params)
    }

    async fn call_action(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let name = require_str(args, "action")?;
        let path = self.action_path(&name, args)?;
        let body = args
            .get("body")
            .filter(|value| !value.is_null())
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.logger
            .info("calling action", Some(&serde_json::json!({"action": name})));
        let data = self.http.request(&path, RequestInit::post(body)).await?;

        let wait = args.get("wait").and_then(|value| value.as_bool()).unwrap_or(false);
        if wait && self.http.spec().job_status.is_some() {
            let timeout_ms = args
                .get("wait_timeout_s")
                .and_then(|value| value.as_u64())
                .unwrap_or(300)
                * 1000;
            // Identifier propagation from the initiating response is not
            // specified; polling starts from an empty parameter map.
            let polled = poll_job(
                &self.http,
                &Map::new(),
                PollOptions {
                    timeout_ms,
                    ..Default::default()
                },
            )
            .await?;
            return Ok(serde_json::json!({"initial": data, "final": polled}));
        }
        Ok(data)
    }

    async fn start_remote_session(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let path = self.action_path("initiate_remote_session", args)?;
        let body = args
            .get("body")
            .filter(|value| !value.is_null())
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.http.request(&path, RequestInit::post(body)).await
    }

    async fn move_endpoint_simple(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let target_org = require_id(args, "targetOrgId")?;
        let path = self.action_path("move_endpoint", args)?;
        let body = serde_json::json!({ "targetOrgId": target_org });
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.http.request(&path, RequestInit::post(body)).await
    }

    async fn modify_group_contents(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let group_id = require_id(args, "groupId")?;
        let contents = self
            .http
            .spec()
            .require_resource("endpoint_groups.contents")?;
        let create = contents.require("endpoint_groups.contents", crate::endpoints::Operation::Create)?;

        let mut params = Map::new();
        params.insert("orgId".to_string(), require_org(args, "group contents")?);
        params.insert("groupId".to_string(), group_id);
        let path = interpolate_path(&create.path, &params)?;

        let add = id_list(args, "add");
        let remove = id_list(args, "remove");
        if add.is_empty() && remove.is_empty() {
            return Err(ToolError::invalid_params("Specify add and/or remove arrays"));
        }
        let mut body = Map::new();
        if !add.is_empty() {
            body.insert("add".to_string(), Value::Array(add));
        }
        if !remove.is_empty() {
            body.insert("remove".to_string(), Value::Array(remove));
        }
        let body = Value::Object(body);
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.http.request(&path, RequestInit::post(body)).await
    }
}

#[async_trait::async_trait]
impl ToolHandler for ActionManager {
    fn tools(&self) -> &'static [&'static str] {
        TOOLS
    }

    async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "call_action" => self.call_action(&args).await,
            "start_remote_session" => self.start_remote_session(&args).await,
            "move_endpoint_simple" => self.move_endpoint_simple(&args).await,
            "modify_group_contents" => self.modify_group_contents(&args).await,
            _ => Err(unknown_tool_error("actions", tool)),
        }
    }
}
