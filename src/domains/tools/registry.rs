//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - The set of tools registered from the OpenAPI document
//! - Argument validation and dispatch to the invocation adapter
//! - Tool metadata for listing, shared by every transport

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use rmcp::model::{CallToolResult, Tool, ToolAnnotations};

use crate::domains::openapi::HttpMethod;

use super::client::ApiTransport;
use super::error::ToolError;
use super::invocation::invoke;
use super::registrar::{RegisteredTool, ToolHost};
use super::results::{error_result, normalize};

// ============================================================================
// Tool Registry
// ============================================================================

/// Registry of the tools generated from the OpenAPI document.
///
/// Filled once at startup through [`ToolHost`], then shared read-only.
pub struct ToolRegistry {
    tools: Vec<Arc<RegisteredTool>>,
    index: HashMap<String, usize>,
    transport: Arc<dyn ApiTransport>,
}

impl ToolRegistry {
    /// Create an empty registry whose tools call through `transport`.
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            transport,
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RegisteredTool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both the rmcp router and the HTTP transport list tools from here.
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| to_tool(t)).collect()
    }

    /// Validate `arguments` and run the named tool.
    ///
    /// Only an unknown tool name is returned as an error. Rejected arguments
    /// and every failure of the call itself end up in the result.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self.get(name).cloned().ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            ToolError::not_found(name)
        })?;

        let accepted = match tool.validators.validate(&arguments.unwrap_or_default()) {
            Ok(accepted) => accepted,
            Err(e) => return Ok(error_result(&ToolError::invalid_arguments(e.to_string()))),
        };

        info!("Calling tool '{}'", name);
        let outcome = invoke(&tool.operation, accepted, self.transport.as_ref()).await;
        Ok(normalize(outcome))
    }
}

impl ToolHost for ToolRegistry {
    fn register_tool(&mut self, tool: RegisteredTool) -> Result<(), ToolError> {
        if self.index.contains_key(&tool.id) {
            return Err(ToolError::DuplicateTool(tool.id));
        }
        self.index.insert(tool.id.clone(), self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(())
    }
}

/// Tool model advertised to clients.
pub fn to_tool(tool: &RegisteredTool) -> Tool {
    Tool {
        name: tool.id.clone().into(),
        description: Some(tool.description.clone().into()),
        input_schema: Arc::new(tool.validators.to_input_schema()),
        annotations: Some(annotations_for_method(tool.method())),
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// MCP hints derived from HTTP method semantics.
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get => (true, false, true),
        HttpMethod::Post => (false, false, false),
        HttpMethod::Put => (false, true, true),
        HttpMethod::Delete => (false, true, true),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(destructive),
        idempotent_hint: Some(idempotent),
        open_world_hint: Some(true),
    }
}
