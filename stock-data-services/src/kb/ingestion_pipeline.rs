use std::path::Path;

use stock_core::AgentError;

use super::document_loader::DocumentLoader;
use super::text_splitter::TextSplitter;
use super::vector_index::VectorIndex;

/// Statistics from an ingestion run
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub documents_loaded: usize,
    pub chunks_indexed: usize,
}

/// Knowledge base ingestion pipeline that:
/// 1. Loads documents from their sources
/// 2. Splits them into overlapping chunks
/// 3. Embeds and indexes every chunk
/// 4. Persists the index for serving
pub struct IngestionPipeline {
    loader: Box<dyn DocumentLoader>,
    splitter: TextSplitter,
    index: VectorIndex,
}

impl IngestionPipeline {
    pub fn new(loader: Box<dyn DocumentLoader>, splitter: TextSplitter, index: VectorIndex) -> Self {
        Self {
            loader,
            splitter,
            index,
        }
    }

    /// Run the full pipeline for a list of document sources.
    ///
    /// A source that cannot be loaded fails the run; nothing is skipped
    /// silently.
    pub fn ingest(&mut self, sources: &[String], persist_path: &Path) -> Result<IngestStats, AgentError> {
        let mut stats = IngestStats::default();

        for source in sources {
            tracing::info!(source, "Loading document...");
            let pages = self.loader.load(source)?;
            let chunks = self.splitter.split_document(&file_name(source), &pages);

            tracing::info!(source, chunks = chunks.len(), "Indexing chunks...");
            self.index.add(&chunks)?;

            stats.documents_loaded += 1;
            stats.chunks_indexed += chunks.len();
        }

        self.index.persist(persist_path)?;
        tracing::info!(
            documents = stats.documents_loaded,
            chunks = stats.chunks_indexed,
            path = %persist_path.display(),
            "Ingestion complete"
        );
        Ok(stats)
    }
}

fn file_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}
