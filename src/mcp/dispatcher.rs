//! Method dispatch for incoming JSON-RPC envelopes.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::{
    CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, ServerInfo,
};

/// Methods understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialize" => Ok(Self::Initialize),
            "notifications/initialized" => Ok(Self::Initialized),
            "ping" => Ok(Self::Ping),
            "tools/list" => Ok(Self::ToolsList),
            "tools/call" => Ok(Self::ToolsCall),
            _ => Err(()),
        }
    }
}

/// Routes requests to the tool registry and wraps every outcome in a
/// response envelope.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    server: ServerInfo,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, server: ServerInfo) -> Self {
        Self { registry, server }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    /// Payload of the `initialize` result.
    pub fn capabilities(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": self.server,
        })
    }

    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(name: "mcp.request", method = %request.method, id = ?request.id);
        let id = request.id.clone();

        let Ok(method) = request.method.parse::<Method>() else {
            warn!(name: "mcp.method.unknown", method = %request.method, "method not found");
            return JsonRpcResponse::failure(id, JsonRpcError::method_not_found());
        };

        match method {
            Method::Initialize => JsonRpcResponse::success(id, self.capabilities()),
            Method::Initialized | Method::Ping => JsonRpcResponse::success(id, json!({})),
            Method::ToolsList => {
                JsonRpcResponse::success(id, json!({ "tools": self.registry.descriptors() }))
            }
            Method::ToolsCall => self.call_tool(id, request.params).await,
        }
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => return JsonRpcResponse::failure(id, JsonRpcError::invalid_params(e)),
            None => {
                return JsonRpcResponse::failure(id, JsonRpcError::invalid_params("missing params"));
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            warn!(name: "mcp.tool.unknown", tool = %params.name, "tool not found");
            return JsonRpcResponse::failure(id, JsonRpcError::method_not_found());
        };

        let arguments = params.arguments.unwrap_or(Value::Null);
        if let Err(e) = tool.schema.validate(&arguments) {
            warn!(name: "mcp.tool.invalid_args", tool = %tool.name, error = %e);
            return JsonRpcResponse::failure(id, JsonRpcError::invalid_params(e));
        }

        match tool.handler.call(arguments).await {
            Ok(output) => {
                info!(
                    name: "mcp.tool.called",
                    tool = %tool.name,
                    is_error = output.is_error,
                    "tool call finished"
                );
                JsonRpcResponse::success(id, output.into_result())
            }
            Err(e) => {
                warn!(name: "mcp.tool.failed", tool = %tool.name, error = %e);
                JsonRpcResponse::failure(id, JsonRpcError::internal(e))
            }
        }
    }
}
