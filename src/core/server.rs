//! MCP Server implementation and lifecycle management.
//!
//! Startup is explicit: configuration, then the OpenAPI document, then one
//! registration pass into a [`ToolRegistry`], then the rmcp router built from
//! that registry. Nothing is registered after the server starts serving.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::Result as CrateResult;
use crate::domains::openapi::ApiDocument;
use crate::domains::tools::{
    ApiTransport, MailjetClient, RegistrationReport, ToolRegistry, build_tool_router,
    register_operations,
};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and dispatches
/// tool calls to the registry built from the OpenAPI document.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tools generated from the OpenAPI document.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Load the OpenAPI document and register its tools against the real
    /// Mailjet API.
    #[instrument(skip_all, fields(profile = %config.tools.profile))]
    pub async fn from_config(config: Config) -> CrateResult<Self> {
        let document = ApiDocument::load(&config.openapi.spec_path).await?;
        let client: Arc<dyn ApiTransport> = Arc::new(MailjetClient::new(&config.mailjet)?);
        info!("Mailjet API base URL: {}", config.mailjet.base_url());

        let (server, _) = Self::with_transport(config, &document, client);
        Ok(server)
    }

    /// Register the tools of `document` with calls going through `transport`.
    pub fn with_transport(
        config: Config,
        document: &ApiDocument,
        transport: Arc<dyn ApiTransport>,
    ) -> (Self, RegistrationReport) {
        let mut registry = ToolRegistry::new(transport);
        let report = register_operations(document, &config.tools.prefixes, &mut registry);
        if registry.is_empty() {
            warn!(
                "No tools registered for profile '{}' - check MCP_TOOL_PREFIXES",
                config.tools.profile
            );
        }

        let registry = Arc::new(registry);
        let server = Self {
            tool_router: build_tool_router::<Self>(registry.clone()),
            config: Arc::new(config),
            registry,
        };
        (server, report)
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.registry
            .get_all_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                    "annotations": t.annotations,
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Returns the serialized `CallToolResult`, or the protocol-level error
    /// message for unknown tools and non-object arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, String> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            _ => return Err("Tool arguments must be an object".to_string()),
        };

        let result = self
            .registry
            .call_tool(name, arguments)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_value(result).map_err(|e| e.to_string())
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.config.server.description.clone()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::{ApiRequest, ApiResponse, ToolError};
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticTransport;

    #[async_trait]
    impl ApiTransport for StaticTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ToolError> {
            Ok(ApiResponse {
                status: 200,
                body: json!({ "path": request.path }).to_string(),
            })
        }
    }

    fn document() -> ApiDocument {
        ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "info": { "title": "Mailjet", "description": "Email API", "version": "3.0" },
            "servers": [{ "url": "https://api.mailjet.com" }],
            "tags": [],
            "paths": {
                "/v3/REST/contactslist": {
                    "get": { "operationId": "get_v3_contactslist", "description": "Lists", "summary": "Get contact lists", "responses": {} }
                },
                "/v3/REST/message": {
                    "get": { "operationId": "get_v3_message", "description": "Messages", "responses": {} }
                }
            }
        }))
        .unwrap()
    }

    fn server(config: Config) -> McpServer {
        McpServer::with_transport(config, &document(), Arc::new(StaticTransport)).0
    }

    #[test]
    fn test_server_info_uses_profile() {
        let mut config = Config::default();
        config.apply_profile(crate::domains::tools::ToolProfile::find("contacts").unwrap());
        let server = server(config);

        let info = server.get_info();
        assert_eq!(info.server_info.name, "mailjet-contacts");
        assert!(info.capabilities.tools.is_some());
        assert_eq!(server.registry().tool_names(), vec!["get_v3_contactslist"]);
    }

    #[test]
    fn test_list_tools_for_http() {
        let server = server(Config::default());
        let tools = server.list_tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "get_v3_contactslist");
        assert_eq!(tools[0]["description"], "Get contact lists");
        assert_eq!(tools[1]["description"], "GET /v3/REST/message");
    }

    #[tokio::test]
    async fn test_bundled_document_with_contacts_profile() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/mailjet-openapi.yaml");
        let document = ApiDocument::load(path).await.unwrap();

        let mut config = Config::default();
        config.apply_profile(crate::domains::tools::ToolProfile::find("contacts").unwrap());
        let (server, report) =
            McpServer::with_transport(config, &document, Arc::new(StaticTransport));

        assert_eq!(
            server.registry().tool_names(),
            vec!["get_v3_contact", "get_v3_contact_id", "get_v3_contactslist"]
        );
        assert_eq!(report.filtered, 4);

        let result = server
            .call_tool("get_v3_contact_id", json!({ "contact_ID": "someone@example.com" }))
            .await
            .unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("/v3/REST/contact/someone%40example.com"));
    }

    #[tokio::test]
    async fn test_call_tool_for_http() {
        let server = server(Config::default());

        // Undeclared arguments are stripped before the call.
        let result = server
            .call_tool("get_v3_message", json!({ "Limit": 2 }))
            .await
            .unwrap();
        assert_eq!(result["isError"], json!(false));
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("GET /v3/REST/message succeeded"));

        assert!(server.call_tool("nope", json!({})).await.is_err());
        assert!(server.call_tool("get_v3_message", json!([1])).await.is_err());
    }
}
