// Routes parsed JSON-RPC messages to the MCP method handlers

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcResponse,
    ListToolsResult, Method, RpcMessage,
};
use crate::tools::{Dispatcher, ToolRegistry};
use airflow_sdk::ClientConfig;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers MCP requests for one Airflow configuration.
pub struct McpHandler {
    registry: ToolRegistry,
    dispatcher: Dispatcher,
}

impl McpHandler {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            registry: ToolRegistry::new(config.access_level()),
            dispatcher: Dispatcher::new(config),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one message. Notifications never produce a response.
    pub async fn handle(&self, message: RpcMessage) -> Option<JsonRpcResponse> {
        match message {
            RpcMessage::Notification { method, .. } => {
                debug!(method = method.as_str(), "received notification");
                None
            }
            RpcMessage::Request { id, method, params } => {
                debug!(method = method.as_str(), id = %id, "received request");
                Some(self.handle_request(id, method, params).await)
            }
        }
    }

    async fn handle_request(&self, id: Value, method: Method, params: Value) -> JsonRpcResponse {
        match method {
            Method::Initialize => success(id, &InitializeResult::current()),
            Method::Ping | Method::Initialized => JsonRpcResponse::success(id, json!({})),
            Method::ToolsList => success(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas().to_vec(),
                },
            ),
            Method::ToolsCall => {
                let result = self.call_tool(params).await;
                success(id, &result)
            }
            Method::Other(name) => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&name)),
        }
    }

    /// Tool failures are reported as error content, never as JSON-RPC errors.
    async fn call_tool(&self, params: Value) -> CallToolResult {
        let params: CallToolParams = serde_json::from_value(params).unwrap_or_default();
        let Some(name) = params.name else {
            return CallToolResult::error("Missing tool name");
        };
        let arguments = params.arguments.unwrap_or(Value::Null);

        match self.dispatcher.execute(&name, &arguments).await {
            Ok(payload) => match serde_json::to_string_pretty(&payload) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::error(e.to_string()),
            },
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                CallToolResult::error(e.to_string())
            }
        }
    }
}

fn success<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}
