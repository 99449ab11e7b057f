pub mod retrieval_tool;
pub mod stock_tools;

// Re-export commonly used items
pub use retrieval_tool::RetrieveDocumentsTool;
pub use stock_tools::{HistoricalPricesTool, RealtimePriceTool};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolSchema;

/// A named, schema-described callable the model may request mid-reasoning.
///
/// `invoke` never fails: every error raised by the underlying use case is
/// captured and encoded as `{"error": "<message>"}` content, so a failing
/// backend becomes something the model can reason about instead of
/// crashing the run.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    async fn invoke(&self, arguments: Value) -> String;
}

/// Name-keyed dispatch table handed to the agent control loop.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn AgentTool>>) -> Self {
        let order: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
        let tools = tools
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self { tools, order }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    /// Schemas in registration order, for binding to the model.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Encode a tool failure as in-band content for the model.
pub(crate) fn error_payload(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}
