//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool handler and widget registry.
//! The stdio transport lives here; the HTTP/SSE transport is in
//! [`crate::mcp::http`].

use std::io::{BufRead, Write};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{BadevandError, McpError, Result};
use crate::mcp::tools::{ToolHandler, UPSTREAM_FAILURE_TEXT};
use crate::mcp::types::*;
use crate::mcp::widgets::WidgetRegistry;

/// MCP Server info
const SERVER_NAME: &str = "badevandet-node";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Danish beach data
pub struct McpServer {
    /// Tool handler
    tool_handler: Arc<ToolHandler>,

    /// Widget markup served as resources
    widgets: Arc<WidgetRegistry>,

    /// Whether initialized
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: Arc<ToolHandler>, widgets: Arc<WidgetRegistry>) -> Self {
        Self {
            tool_handler,
            widgets,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        let reader = stdin.lock();

        tracing::info!("Serving MCP over stdio");

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let response_str = serde_json::to_string(&response)?;
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&mut self, message: &str) -> Result<Option<JsonRpcResponse>> {
        // Try to parse as request
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        tracing::debug!(method = %request.method, "Received request");

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return Ok(None);
        };

        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => self.handle_list_tools(),
            methods::CALL_TOOL => self.handle_call_tool(&request).await,
            methods::LIST_RESOURCES => self.handle_list_resources(),
            methods::LIST_RESOURCE_TEMPLATES => self.handle_list_resource_templates(),
            methods::READ_RESOURCE => self.handle_read_resource(&request),
            _ => {
                return Ok(Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::method_not_found(&request.method),
                )))
            }
        };

        Ok(Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, rpc_error(e)),
        }))
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        if request.method == methods::INITIALIZED {
            self.initialized = true;
        } else {
            tracing::debug!(method = %request.method, "Ignoring notification");
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    ///
    /// Upstream failures become an `isError` tool result; argument problems
    /// are JSON-RPC errors.
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params: CallToolParams = params(request)?;

        let result = match self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await
        {
            Ok(result) => result,
            Err(BadevandError::Upstream(e)) => {
                tracing::warn!(tool = %params.name, "Beach fetch failed: {}", e);
                CallToolResult::error(UPSTREAM_FAILURE_TEXT)
            }
            Err(e) => return Err(e),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_resources(&self) -> Result<Value> {
        let result = ListResourcesResult {
            resources: self.widgets.iter().map(|w| w.resource()).collect(),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_resource_templates(&self) -> Result<Value> {
        let result = ListResourceTemplatesResult {
            resource_templates: self.widgets.iter().map(|w| w.resource_template()).collect(),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_read_resource(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params: ReadResourceParams = params(request)?;

        let widget = self
            .widgets
            .by_uri(&params.uri)
            .ok_or(McpError::UnknownResource { uri: params.uri })?;

        let result = ReadResourceResult {
            contents: vec![widget.contents()],
        };

        Ok(serde_json::to_value(result)?)
    }
}

fn params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T> {
    let params = request.params.clone().ok_or_else(|| McpError::ProtocolError {
        message: format!("Missing parameters for {}", request.method),
    })?;

    serde_json::from_value(params).map_err(|e| {
        McpError::ProtocolError {
            message: format!("Invalid parameters for {}: {}", request.method, e),
        }
        .into()
    })
}

/// Map a failed request to its JSON-RPC error
fn rpc_error(err: BadevandError) -> JsonRpcError {
    match err {
        BadevandError::Mcp(McpError::InvalidArguments { field, constraint }) => {
            JsonRpcError::invalid_params(format!("Invalid argument '{}': {}", field, constraint))
                .with_data(json!({ "field": field, "constraint": constraint }))
        }
        BadevandError::Mcp(e @ McpError::UnknownTool { .. })
        | BadevandError::Mcp(e @ McpError::UnknownResource { .. })
        | BadevandError::Mcp(e @ McpError::ProtocolError { .. }) => {
            JsonRpcError::invalid_params(e.to_string())
        }
        other => {
            tracing::error!("Request failed: {}", other);
            JsonRpcError::internal_error(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beaches::client::FixtureBeachSource;
    use crate::mcp::widgets::tests::stub_registry;

    fn server() -> McpServer {
        let widgets = Arc::new(stub_registry());
        let source = Arc::new(FixtureBeachSource::new(vec![]));
        McpServer::new(Arc::new(ToolHandler::new(source, widgets.clone())), widgets)
    }

    #[test]
    fn test_server_info() {
        assert_eq!(SERVER_NAME, "badevandet-node");
    }

    #[tokio::test]
    async fn test_initialized_notification() {
        let mut server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();

        assert!(response.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":4,"method":"prompts/list"}"#)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_read_unknown_resource() {
        let mut server = server();
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":5,"method":"resources/read","params":{"uri":"ui://widget/nope.html"}}"#,
            )
            .await
            .unwrap()
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("ui://widget/nope.html"));
    }
}
