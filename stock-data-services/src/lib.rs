pub mod kb;
pub mod stock_data;

// Re-export commonly used items
pub use kb::{
    DocumentLoader, Embedder, FastembedEmbedder, HashEmbedder, IngestStats, IngestionPipeline,
    PageText, SplitConfig, TextDocumentLoader, TextSplitter, VectorIndex,
};
pub use stock_data::{HistoryRange, StockDataProvider, YahooFinanceProvider};
