use serde::{Deserialize, Serialize};
use serde_json::Value;
use stock_agent::AgentEvent;

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 Success Response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub result: Value,
}

/// JSON-RPC 2.0 Error Response
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub error: ErrorObject,
}

/// JSON-RPC Error Object
#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 Notification, emitted once per agent event while a query
/// is streaming.
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn event(id: &Option<Value>, event: &AgentEvent) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: "agent.event".to_string(),
            params: serde_json::json!({
                "id": id,
                "event": event,
            }),
        }
    }
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Custom error codes for agent operations
pub const UNAUTHORIZED: i32 = -32001;
pub const AGENT_FAILED: i32 = -32002;

/// agent.query request parameters
#[derive(Debug, Deserialize)]
pub struct AgentQueryRequest {
    /// Signed bearer token
    pub token: String,
    /// The user's natural-language question
    pub prompt: String,
    /// Client-supplied session id for trace grouping
    #[serde(default)]
    pub session_id: Option<String>,
}

/// agent.query final result, sent after the last event notification
#[derive(Debug, Serialize)]
pub struct AgentQueryResult {
    pub done: bool,
    pub events: usize,
}
