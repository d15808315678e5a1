//! Shared types for the SDK.
//!
//! These types mirror the server's wire shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel carrying full todo list snapshots.
pub const TODOS_CHANNEL: &str = "todos";

// =============================================================================
// Todos
// =============================================================================

/// Todo identifier; numeric on the reference store, text on some others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Int(i64),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A todo item as stored by the backing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

// =============================================================================
// JSON-RPC
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

// =============================================================================
// Tools
// =============================================================================

/// Entry of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolResult {
    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `GET /health` body.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub version: String,
}

// =============================================================================
// Event stream
// =============================================================================

/// Event decoded from the server's event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ServerInfo {
        name: String,
        version: String,
        protocol_version: String,
        #[serde(default)]
        capabilities: Value,
        session_id: String,
        endpoint: String,
    },
    Ping {
        timestamp: String,
    },
    Message {
        channel: String,
        data: Value,
    },
    Response(RpcResponse),
    /// Event types this SDK does not know yet.
    #[serde(other)]
    Unknown,
}
