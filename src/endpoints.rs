//! Declarative description of the wrapped REST API: which resources exist,
//! which CRUD operations each one supports, the path template and method per
//! operation, named POST-only actions, and the global auth / pagination /
//! job-status configuration. Built once at startup and treated as immutable;
//! dispatch happens by typed lookup so an unsupported combination surfaces as
//! `UNSUPPORTED_OPERATION` instead of being attempted against the network.

use crate::errors::ToolError;
use once_cell::sync::Lazy;
use reqwest::Method;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub path: String,
    pub method: Method,
}

impl EndpointDescriptor {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            path: path.to_string(),
            method,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceDescriptor {
    pub list: Option<EndpointDescriptor>,
    pub get: Option<EndpointDescriptor>,
    pub create: Option<EndpointDescriptor>,
    pub update: Option<EndpointDescriptor>,
    pub delete: Option<EndpointDescriptor>,
    pub subresources: HashMap<String, ResourceDescriptor>,
}

impl ResourceDescriptor {
    pub fn operation(&self, op: Operation) -> Option<&EndpointDescriptor> {
        match op {
            Operation::List => self.list.as_ref(),
            Operation::Get => self.get.as_ref(),
            Operation::Create => self.create.as_ref(),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        }
    }

    pub fn require(&self, resource: &str, op: Operation) -> Result<&EndpointDescriptor, ToolError> {
        self.operation(op).ok_or_else(|| {
            ToolError::unsupported_operation(format!(
                "Resource \"{}\" does not support {}",
                resource,
                op.as_str()
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    ApiKey,
    Bearer,
    Basic,
    OAuth2,
}

impl AuthScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthScheme::ApiKey => "apiKey",
            AuthScheme::Bearer => "bearer",
            AuthScheme::Basic => "basic",
            AuthScheme::OAuth2 => "oauth2",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub scheme: AuthScheme,
    /// Header name for the `apiKey` scheme.
    pub header: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    None,
    Page,
    Cursor,
    Link,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub style: PaginationStyle,
    pub page_param: Option<String>,
    pub per_page_param: Option<String>,
    pub cursor_param: Option<String>,
    pub next_field: Option<String>,
}

impl PaginationConfig {
    pub fn none() -> Self {
        Self {
            style: PaginationStyle::None,
            page_param: None,
            per_page_param: None,
            cursor_param: None,
            next_field: None,
        }
    }
}

/// Named POST-only operation outside CRUD semantics (move an endpoint,
/// start a remote session, ...).
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct JobStatusConfig {
    pub path_template: String,
    pub label_field: Option<String>,
    pub status_field: String,
    pub success_values: Vec<String>,
    pub failure_values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EndpointsSpec {
    pub base_url: String,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub resources: HashMap<String, ResourceDescriptor>,
    pub actions: HashMap<String, ActionDescriptor>,
    pub job_status: Option<JobStatusConfig>,
}

impl EndpointsSpec {
    /// Looks up a resource by name. Sub-resources are addressed with dotted
    /// names, e.g. `endpoints.missingUpdates`.
    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        let mut segments = name.split('.');
        let mut current = self.resources.get(segments.next()?)?;
        for segment in segments {
            current = current.subresources.get(segment)?;
        }
        Some(current)
    }

    pub fn require_resource(&self, name: &str) -> Result<&ResourceDescriptor, ToolError> {
        self.resource(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.resources.keys().map(String::as_str).collect();
            known.sort_unstable();
            ToolError::unsupported_operation(format!("Unknown resource \"{}\"", name))
                .with_hint(format!("Known resources: {}", known.join(", ")))
        })
    }

    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    pub fn require_action(&self, name: &str) -> Result<&ActionDescriptor, ToolError> {
        self.action(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.actions.keys().map(String::as_str).collect();
            known.sort_unstable();
            ToolError::unsupported_operation(format!("Unknown action \"{}\"", name))
                .with_hint(format!("Known actions: {}", known.join(", ")))
        })
    }
}

static BUILTIN: Lazy<EndpointsSpec> = Lazy::new(build_builtin);

/// The wrapped API surface, defined once at process start.
pub fn builtin() -> &'static EndpointsSpec {
    &BUILTIN
}

fn ep(method: Method, path: &str) -> EndpointDescriptor {
    EndpointDescriptor::new(method, path)
}

fn build_builtin() -> EndpointsSpec {
    let mut resources = HashMap::new();

    resources.insert(
        "organizations".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/organizations")),
            ..Default::default()
        },
    );

    resources.insert(
        "endpoints_status".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/endpoints/status/{orgId}")),
            ..Default::default()
        },
    );

    let mut endpoint_subs = HashMap::new();
    endpoint_subs.insert(
        "general".to_string(),
        ResourceDescriptor {
            get: Some(ep(Method::GET, "/endpoints/managed/{orgId}/{endpointId}/general")),
            ..Default::default()
        },
    );
    endpoint_subs.insert(
        "missingUpdates".to_string(),
        ResourceDescriptor {
            list: Some(ep(
                Method::GET,
                "/endpoints/managed/{orgId}/{endpointId}/missing-updates",
            )),
            ..Default::default()
        },
    );
    endpoint_subs.insert(
        "remoteSessions".to_string(),
        ResourceDescriptor {
            get: Some(ep(
                Method::GET,
                "/endpoints/managed/{orgId}/{endpointId}/remote-sessions/{sessionId}",
            )),
            update: Some(ep(
                Method::PATCH,
                "/endpoints/managed/{orgId}/{endpointId}/remote-sessions/{sessionId}",
            )),
            ..Default::default()
        },
    );
    resources.insert(
        "endpoints".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/endpoints/managed/{orgId}")),
            get: Some(ep(Method::GET, "/endpoints/managed/{orgId}/{endpointId}")),
            update: Some(ep(Method::PATCH, "/endpoints/managed/{orgId}/{endpointId}")),
            delete: Some(ep(Method::DELETE, "/endpoints/managed/{orgId}/{endpointId}")),
            subresources: endpoint_subs,
            ..Default::default()
        },
    );

    let mut group_subs = HashMap::new();
    group_subs.insert(
        "contents".to_string(),
        ResourceDescriptor {
            list: Some(ep(
                Method::GET,
                "/endpoints/groups/{orgId}/{groupId}/contents",
            )),
            create: Some(ep(
                Method::POST,
                "/endpoints/groups/{orgId}/{groupId}/contents",
            )),
            ..Default::default()
        },
    );
    resources.insert(
        "endpoint_groups".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/endpoints/groups/{orgId}")),
            create: Some(ep(Method::POST, "/endpoints/groups/{orgId}")),
            get: Some(ep(Method::GET, "/endpoints/groups/{orgId}/{groupId}")),
            update: Some(ep(Method::PATCH, "/endpoints/groups/{orgId}/{groupId}")),
            delete: Some(ep(Method::DELETE, "/endpoints/groups/{orgId}/{groupId}")),
            subresources: group_subs,
        },
    );

    resources.insert(
        "search".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/search/{orgId}")),
            ..Default::default()
        },
    );

    resources.insert(
        "agent_deployment".to_string(),
        ResourceDescriptor {
            get: Some(ep(Method::GET, "/endpoints/agent-deployment/{orgId}")),
            update: Some(ep(Method::PATCH, "/endpoints/agent-deployment/{orgId}")),
            ..Default::default()
        },
    );

    resources.insert(
        "agent_installation".to_string(),
        ResourceDescriptor {
            get: Some(ep(
                Method::GET,
                "/endpoints/agent-installation/{orgId}/{installType}",
            )),
            ..Default::default()
        },
    );

    resources.insert(
        "deployers".to_string(),
        ResourceDescriptor {
            list: Some(ep(Method::GET, "/endpoints/deployers/{orgId}")),
            get: Some(ep(Method::GET, "/endpoints/deployers/{orgId}/{deployerId}")),
            delete: Some(ep(
                Method::DELETE,
                "/endpoints/deployers/{orgId}/{deployerId}",
            )),
            ..Default::default()
        },
    );

    resources.insert(
        "deployer_installation_windows".to_string(),
        ResourceDescriptor {
            list: Some(ep(
                Method::GET,
                "/endpoints/deployer-installation/{orgId}/windowsEXE",
            )),
            ..Default::default()
        },
    );

    let mut actions = HashMap::new();
    actions.insert(
        "move_endpoint".to_string(),
        ActionDescriptor {
            path: "/endpoints/managed/{orgId}/{endpointId}/move".to_string(),
        },
    );
    actions.insert(
        "initiate_remote_session".to_string(),
        ActionDescriptor {
            path: "/endpoints/managed/{orgId}/{endpointId}/remote-sessions".to_string(),
        },
    );
    actions.insert(
        "license_enterprise_trial".to_string(),
        ActionDescriptor {
            path: "/license/enterprise/trial".to_string(),
        },
    );

    EndpointsSpec {
        base_url: "https://app.action1.com/api/3.0".to_string(),
        auth: AuthConfig {
            scheme: AuthScheme::OAuth2,
            header: None,
        },
        pagination: PaginationConfig {
            style: PaginationStyle::Cursor,
            page_param: None,
            per_page_param: Some("limit".to_string()),
            cursor_param: Some("next_page".to_string()),
            next_field: None,
        },
        resources,
        actions,
        job_status: None,
    }
}
