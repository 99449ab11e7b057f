use stock_core::AgentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Agent run failed: {0}")]
    AgentFailed(#[from] AgentError),
}

impl RpcError {
    /// Get the JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        use crate::protocol::*;
        match self {
            RpcError::ParseError(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => INVALID_REQUEST,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::InternalError(_) => INTERNAL_ERROR,
            RpcError::Unauthorized(_) => UNAUTHORIZED,
            RpcError::AgentFailed(_) => AGENT_FAILED,
        }
    }

    /// Get additional error data (optional)
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            // The failure condition matters to callers: a recursion-limit
            // abort is not a model error
            RpcError::AgentFailed(inner) => Some(serde_json::json!({
                "condition": condition_label(inner),
            })),
            _ => None,
        }
    }
}

fn condition_label(error: &AgentError) -> &'static str {
    match error {
        AgentError::InvalidArgument(_) => "invalid_argument",
        AgentError::SourceUnavailable(_) => "source_unavailable",
        AgentError::IndexNotFound(_) => "index_not_found",
        AgentError::NotIndexed => "not_indexed",
        AgentError::NotLoaded => "not_loaded",
        AgentError::DataUnavailable(_) => "data_unavailable",
        AgentError::UnknownTool(_) => "unknown_tool",
        AgentError::RecursionLimitExceeded(_) => "recursion_limit_exceeded",
        AgentError::Timeout(_) => "timeout",
        AgentError::Model(_) => "model_error",
        AgentError::Embedding(_) => "embedding_error",
        AgentError::Io(_) => "io_error",
        AgentError::Serialization(_) => "serialization_error",
    }
}

// Convert serde_json errors raised while building responses
impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_failure_codes_carry_condition() {
        let err = RpcError::AgentFailed(AgentError::RecursionLimitExceeded(10));
        assert_eq!(err.code(), crate::protocol::AGENT_FAILED);
        assert_eq!(
            err.data().unwrap()["condition"],
            "recursion_limit_exceeded"
        );

        let err = RpcError::AgentFailed(AgentError::UnknownTool("x".to_string()));
        assert_eq!(err.data().unwrap()["condition"], "unknown_tool");
    }
}
