use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use stock_core::{AgentError, ChatMessage};

/// Declared schema for one callable tool, bound to the model so it can
/// request invocations by name.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments object
    pub parameters: Value,
}

/// Language model backend port.
///
/// An implementation carries its bound tool schemas; `invoke` takes the full
/// message history and returns the model's next message, which may request
/// zero or more tool invocations. The control loop never sees the concrete
/// SDK behind this trait.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage, AgentError>;
}
