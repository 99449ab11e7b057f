pub mod document_loader;
pub mod embedder;
pub mod ingestion_pipeline;
pub mod text_splitter;
pub mod vector_index;

// Re-export commonly used items
pub use document_loader::{DocumentLoader, PageText, TextDocumentLoader};
pub use embedder::{Embedder, FastembedEmbedder, HashEmbedder};
pub use ingestion_pipeline::{IngestStats, IngestionPipeline};
pub use text_splitter::{SplitConfig, TextSplitter};
pub use vector_index::VectorIndex;
