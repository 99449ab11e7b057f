pub mod error;
pub mod types;

// Re-export common types
pub use error::AgentError;
pub use types::{
    ChatMessage, DocumentChunk, HistoricalPrices, HistoricalRecord, Role, StockPrice, ToolCall,
};
