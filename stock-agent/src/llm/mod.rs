pub mod language_model;
pub mod openai_client;

// Re-export commonly used items
pub use language_model::{LanguageModel, ToolSchema};
pub use openai_client::{LlmConfig, OpenAiChatModel};
