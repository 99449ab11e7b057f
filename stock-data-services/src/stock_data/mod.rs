pub mod provider;
pub mod yahoo;

// Re-export commonly used items
pub use provider::{HistoryRange, StockDataProvider};
pub use yahoo::YahooFinanceProvider;
