//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Used by the STDIO and TCP transports. Every registered tool becomes one
//! dynamic route that dispatches back into [`ToolRegistry::call_tool`].

use futures::FutureExt;
use std::sync::Arc;

use rmcp::handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter};

use super::registry::{ToolRegistry, to_tool};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .tool_names()
        .into_iter()
        .filter_map(|name| registry.get(name).cloned())
        .fold(ToolRouter::new(), |router, tool| {
            let registry = registry.clone();
            let name = tool.id.clone();
            router.with_route(ToolRoute::new_dyn(
                to_tool(&tool),
                move |ctx: ToolCallContext<'_, S>| {
                    let registry = registry.clone();
                    let name = name.clone();
                    let args = ctx.arguments.clone();
                    async move {
                        registry
                            .call_tool(&name, args)
                            .await
                            .map_err(|e| e.to_mcp_error())
                    }
                    .boxed()
                },
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openapi::ApiDocument;
    use crate::domains::tools::client::{ApiRequest, ApiResponse, ApiTransport};
    use crate::domains::tools::error::ToolError;
    use crate::domains::tools::registrar::register_operations;
    use async_trait::async_trait;
    use serde_json::json;

    struct TestServer {}

    struct NoNetwork;

    #[async_trait]
    impl ApiTransport for NoNetwork {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, ToolError> {
            Err(ToolError::transport("network disabled in tests"))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let document = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "info": { "title": "Mailjet", "description": "Email API", "version": "3.0" },
            "servers": [{ "url": "https://api.mailjet.com" }],
            "tags": [],
            "paths": {
                "/v3/REST/sender": {
                    "get": { "operationId": "get_v3_sender", "description": "List senders", "responses": {} }
                },
                "/v3/REST/template": {
                    "get": { "operationId": "get_v3_template", "description": "List templates", "responses": {} }
                }
            }
        }))
        .unwrap();

        let mut registry = ToolRegistry::new(Arc::new(NoNetwork));
        register_operations::<&str>(&document, &[], &mut registry);
        Arc::new(registry)
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(registry());
        let tools = router.list_all();
        assert_eq!(tools.len(), 2);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"get_v3_sender"));
        assert!(names.contains(&"get_v3_template"));
    }

    #[test]
    fn test_registry_matches_router() {
        let registry = registry();
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(registry.clone());
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
