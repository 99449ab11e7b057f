pub mod document_chunk;
pub mod message;
pub mod stock_price;

// Re-export common types
pub use document_chunk::DocumentChunk;
pub use message::{ChatMessage, Role, ToolCall};
pub use stock_price::{HistoricalPrices, HistoricalRecord, StockPrice};

/// Stock ticker symbol (e.g., "AMZN", "AAPL")
pub type TickerSymbol = String;
