pub mod agent;
pub mod llm;
pub mod observability;
pub mod tools;
pub mod use_cases;

// Re-export commonly used items
pub use agent::{AgentConfig, AgentEvent, AgentGraph, AgentNode, AgentRun};
pub use llm::{LanguageModel, LlmConfig, OpenAiChatModel, ToolSchema};
pub use observability::{AgentObserver, RunMetadata, TracingObserver};
pub use tools::{AgentTool, ToolRegistry};
pub use use_cases::{
    GetHistoricalPricesUseCase, GetRealtimePriceUseCase, RetrieveDocumentsUseCase, RunAgentUseCase,
};
