use crate::endpoints::{Operation, PaginationStyle};
use crate::errors::ToolError;
use crate::managers::{
    check_guard, id_list, optional_id, optional_str, or_deleted, require_id, require_org,
    require_str, resolve_org, string_list, unknown_tool_error, ToolHandler,
};
use crate::services::http::{HttpService, RequestInit};
use crate::services::logger::Logger;
use crate::services::paginate::Paginator;
use crate::services::resolve::{resolve_to_ids, ResolveQuery};
use crate::utils::interpolate::interpolate_path;
use crate::utils::qs::qs;
use serde_json::{Map, Value};
use std::sync::Arc;

const TOOLS: &[&str] = &[
    "list_resources",
    "get_resource",
    "create_resource",
    "update_resource",
    "delete_resource",
    "search_resources",
    "remove_entities",
];

/// Generic CRUD dispatch over the endpoint registry: one set of tools works
/// against every described resource.
pub struct ResourceManager {
    logger: Logger,
    http: Arc<HttpService>,
}

impl ResourceManager {
    pub fn new(logger: Logger, http: Arc<HttpService>) -> Self {
        Self {
            logger: logger.child("resources"),
            http,
        }
    }

    async fn list_resources(&self, args: &Value) -> Result<Value, ToolError> {
        let resource = require_str(args, "resource")?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let list = descriptor.require(&resource, Operation::List)?;

        let mut path = list.path.clone();
        if path.contains("{orgId}") {
            let org = require_org(args, &format!("resource \"{}\"", resource))?;
            let mut params = Map::new();
            params.insert("orgId".to_string(), org);
            path = interpolate_path(&path, &params)?;
        }

        let mut params: Map<String, Value> = args
            .get("filters")
            .and_then(|value| value.as_object())
            .cloned()
            .unwrap_or_default();
        let pagination = &self.http.spec().pagination;
        match pagination.style {
            PaginationStyle::Page => {
                if let Some(page) = args.get("page").filter(|value| !value.is_null()) {
                    let param = pagination.page_param.as_deref().unwrap_or("page");
                    params.insert(param.to_string(), page.clone());
                }
                if let Some(per_page) = args.get("per_page").filter(|value| !value.is_null()) {
                    let param = pagination.per_page_param.as_deref().unwrap_or("per_page");
                    params.insert(param.to_string(), per_page.clone());
                }
            }
            PaginationStyle::Cursor => {
                if let Some(cursor) = args.get("cursor").and_then(|value| value.as_str()) {
                    let param = pagination.cursor_param.as_deref().unwrap_or("cursor");
                    params.insert(param.to_string(), Value::String(cursor.to_string()));
                }
            }
            _ => {}
        }

        // A pinned page or cursor means the caller drives pagination
        // themselves; hand back exactly one batch.
        let pinned = args.get("page").is_some_and(|value| !value.is_null())
            || args.get("cursor").is_some_and(|value| !value.is_null());

        let mut paginator = Paginator::new(&self.http, path, params);
        let mut items = Vec::new();
        while let Some(batch) = paginator.next_batch().await? {
            items.extend(batch);
            if pinned {
                break;
            }
        }
        self.logger.debug(
            "listed resource",
            Some(&serde_json::json!({"resource": resource, "count": items.len()})),
        );
        Ok(serde_json::json!({ "items": items }))
    }

    async fn get_resource(&self, args: &Value) -> Result<Value, ToolError> {
        let resource = require_str(args, "resource")?;
        let id = require_id(args, "id")?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let get = descriptor.require(&resource, Operation::Get)?;

        let mut params = Map::new();
        params.insert("id".to_string(), id.clone());
        if get.path.contains("{orgId}") {
            params.insert(
                "orgId".to_string(),
                require_org(args, &format!("resource \"{}\"", resource))?,
            );
        }
        if get.path.contains("{endpointId}") {
            params.insert(
                "endpointId".to_string(),
                optional_id(args, "endpointId").unwrap_or_else(|| id.clone()),
            );
        }
        if get.path.contains("{groupId}") {
            params.insert("groupId".to_string(), id.clone());
        }
        if get.path.contains("{installType}") {
            params.insert("installType".to_string(), id.clone());
        }
        let path = interpolate_path(&get.path, &params)?;
        self.http.get_with_retry(&path).await
    }

    async fn create_resource(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let resource = require_str(args, "resource")?;
        let body = args
            .get("body")
            .filter(|value| value.is_object())
            .cloned()
            .ok_or_else(|| ToolError::invalid_params("body must be an object"))?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let create = descriptor.require(&resource, Operation::Create)?;

        let mut path = create.path.clone();
        if path.contains("{orgId}") {
            let mut params = Map::new();
            params.insert(
                "orgId".to_string(),
                require_org(args, &format!("resource \"{}\"", resource))?,
            );
            path = interpolate_path(&path, &params)?;
        }
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.http
            .request(&path, RequestInit::new(create.method.clone()).with_body(body))
            .await
    }

    async fn update_resource(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let resource = require_str(args, "resource")?;
        let id = require_id(args, "id")?;
        let body = args
            .get("body")
            .filter(|value| value.is_object())
            .cloned()
            .ok_or_else(|| ToolError::invalid_params("body must be an object"))?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let update = descriptor.require(&resource, Operation::Update)?;

        let mut params = Map::new();
        if update.path.contains("{orgId}") {
            params.insert(
                "orgId".to_string(),
                require_org(args, &format!("resource \"{}\"", resource))?,
            );
        }
        if update.path.contains("{endpointId}") {
            params.insert(
                "endpointId".to_string(),
                optional_id(args, "endpointId").unwrap_or_else(|| id.clone()),
            );
        }
        if update.path.contains("{groupId}") {
            params.insert("groupId".to_string(), id.clone());
        }
        let path = interpolate_path(&update.path, &params)?;
        if dry_run {
            return Ok(serde_json::json!({"path": path, "body": body, "dry_run": true}));
        }
        self.http
            .request(&path, RequestInit::new(update.method.clone()).with_body(body))
            .await
    }

    async fn delete_resource(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let resource = require_str(args, "resource")?;
        let id = require_id(args, "id")?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let delete = descriptor.require(&resource, Operation::Delete)?;

        let mut params = Map::new();
        if delete.path.contains("{orgId}") {
            params.insert(
                "orgId".to_string(),
                require_org(args, &format!("resource \"{}\"", resource))?,
            );
        }
        if delete.path.contains("{endpointId}") {
            params.insert("endpointId".to_string(), id.clone());
        }
        if delete.path.contains("{groupId}") {
            params.insert("groupId".to_string(), id.clone());
        }
        let path = interpolate_path(&delete.path, &params)?;
        if dry_run {
            return Ok(serde_json::json!({"path": path, "dry_run": true}));
        }
        let data = self.http.request(&path, RequestInit::delete()).await?;
        Ok(or_deleted(data))
    }

    async fn search_resources(&self, args: &Value) -> Result<Value, ToolError> {
        let query = require_str(args, "query")?;
        let limit = args.get("limit").and_then(|value| value.as_u64());

        if let Some(search) = self
            .http
            .spec()
            .resource("search")
            .and_then(|descriptor| descriptor.list.as_ref())
        {
            let org = require_org(args, "search")?;
            let mut params = Map::new();
            params.insert("orgId".to_string(), org);
            let path = interpolate_path(&search.path, &params)?;
            let mut query_params = Map::new();
            query_params.insert("q".to_string(), Value::String(query));
            if let Some(limit) = limit {
                query_params.insert("limit".to_string(), Value::from(limit));
            }
            return self
                .http
                .get_with_retry(&format!("{}{}", path, qs(&query_params)))
                .await;
        }

        // No official search endpoint: fall back to a client-side substring
        // filter over a listable resource.
        let resource = optional_str(args, "resource").ok_or_else(|| {
            ToolError::invalid_params("No search endpoint; provide resource for client-side search")
        })?;
        let descriptor = self.http.spec().require_resource(&resource)?;
        let list = descriptor.require(&resource, Operation::List)?;
        let mut path = list.path.clone();
        if path.contains("{orgId}") {
            let mut params = Map::new();
            params.insert("orgId".to_string(), require_org(args, "resource search")?);
            path = interpolate_path(&path, &params)?;
        }
        let data = self.http.get_with_retry(&path).await?;
        let needle = query.to_lowercase();
        let mut matches: Vec<Value> = crate::utils::items::extract_items(&data)
            .into_iter()
            .filter(|item| {
                serde_json::to_string(item)
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect();
        if let Some(limit) = limit {
            matches.truncate(limit as usize);
        }
        Ok(serde_json::json!({
            "items": matches,
            "warning": "Client-side search; official search endpoint not configured.",
        }))
    }

    async fn remove_entities(&self, args: &Value) -> Result<Value, ToolError> {
        let dry_run = check_guard(args)?;
        let resource = require_str(args, "resource")?;

        let mut targets: Vec<Value> = id_list(args, "ids");
        let names = string_list(args, "names");
        let emails = string_list(args, "emails");
        if targets.is_empty() && (!names.is_empty() || !emails.is_empty()) {
            let resolved = resolve_to_ids(
                &self.http,
                &ResolveQuery {
                    resource: resource.clone(),
                    org_id: resolve_org(args),
                    names,
                    emails,
                    labels: Vec::new(),
                },
            )
            .await?;
            targets = resolved.into_iter().map(|entity| entity.id).collect();
        }
        if targets.is_empty() {
            return Ok(serde_json::json!({
                "executed": 0,
                "results": [],
                "note": "No targets resolved.",
            }));
        }

        let canonical = match resource.as_str() {
            "endpoints" | "endpoint" | "devices" => "endpoints",
            "endpoint_groups" => "endpoint_groups",
            other => {
                return Err(ToolError::unsupported_operation(format!(
                    "No removal strategy for resource \"{}\"",
                    other
                )))
            }
        };
        let delete = self
            .http
            .spec()
            .require_resource(canonical)?
            .require(canonical, Operation::Delete)?
            .clone();
        let needs_org = delete.path.contains("{orgId}");
        let org = resolve_org(args);

        // Deletes run sequentially; one target's failure must not abort the
        // remainder, so per-target outcomes accumulate.
        let mut results = Vec::new();
        for target in targets {
            if dry_run {
                results.push(serde_json::json!({
                    "target": target,
                    "result": { "dry_run": true, "resource": canonical },
                }));
                continue;
            }
            if needs_org && org.is_none() {
                results.push(serde_json::json!({
                    "target": target,
                    "error": format!("orgId required for {}", canonical),
                }));
                continue;
            }
            let mut params = Map::new();
            if let Some(org) = org.clone() {
                params.insert("orgId".to_string(), org);
            }
            if delete.path.contains("{endpointId}") {
                params.insert("endpointId".to_string(), target.clone());
            }
            if delete.path.contains("{groupId}") {
                params.insert("groupId".to_string(), target.clone());
            }
            let outcome = match interpolate_path(&delete.path, &params) {
                Ok(path) => self.http.request(&path, RequestInit::delete()).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(data) => results.push(serde_json::json!({
                    "target": target,
                    "result": or_deleted(data),
                })),
                Err(err) => {
                    self.logger.warn(
                        "remove target failed",
                        Some(&serde_json::json!({"target": target, "error": err.message})),
                    );
                    results.push(serde_json::json!({
                        "target": target,
                        "error": err.message,
                    }));
                }
            }
        }
        Ok(serde_json::json!({ "executed": results.len(), "results": results }))
    }
}

#[async_trait::async_trait]
impl ToolHandler for ResourceManager {
    fn tools(&self) -> &'static [&'static str] {
        TOOLS
    }

    async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "list_resources" => self.list_resources(&args).await,
            "get_resource" => self.get_resource(&args).await,
            "create_resource" => self.create_resource(&args).await,
            "update_resource" => self.update_resource(&args).await,
            "delete_resource" => self.delete_resource(&args).await,
            "search_resources" => self.search_resources(&args).await,
            "remove_entities" => self.remove_entities(&args).await,
            _ => Err(unknown_tool_error("resources", tool)),
        }
    }
}
