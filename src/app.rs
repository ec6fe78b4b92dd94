use crate::endpoints;
use crate::errors::ToolError;
use crate::managers::actions::ActionManager;
use crate::managers::devices::DeviceManager;
use crate::managers::diagnostics::DiagnosticsManager;
use crate::managers::resources::ResourceManager;
use crate::managers::ToolHandler;
use crate::mcp::catalog::tool_catalog;
use crate::services::http::{HttpService, TokenCache};
use crate::services::logger::Logger;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing = Vec::new();
        for tool in tool_catalog().iter() {
            if !handlers.contains_key(&tool.name) {
                missing.push(tool.name.clone());
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint(
                "This is a server wiring bug: every tool in tool_catalog.json must have a handler.",
            )
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("opsbridge");
        let spec = Arc::new(endpoints::builtin().clone());
        let http = Arc::new(HttpService::new(
            logger.child("http"),
            spec,
            TokenCache::new(),
        )?);

        let managers: Vec<Arc<dyn ToolHandler>> = vec![
            Arc::new(ResourceManager::new(logger.clone(), http.clone())),
            Arc::new(ActionManager::new(logger.clone(), http.clone())),
            Arc::new(DeviceManager::new(logger.clone(), http.clone())),
            Arc::new(DiagnosticsManager::new(logger.clone(), http.clone())),
        ];

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for manager in managers {
            for tool in manager.tools() {
                handlers.insert(tool.to_string(), manager.clone());
            }
        }
        Self::validate_tool_wiring(&handlers)?;

        Ok(Self { logger, handlers })
    }

    pub async fn handle_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(name) else {
            let mut known: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
            known.sort_unstable();
            return Err(ToolError::not_found(format!("Unknown tool \"{}\"", name))
                .with_hint(format!("Known tools: {}", known.join(", "))));
        };
        handler.handle_tool(name, args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
