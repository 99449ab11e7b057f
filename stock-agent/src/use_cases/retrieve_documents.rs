use std::sync::Arc;

use stock_core::AgentError;
use stock_data_services::VectorIndex;

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Use-case: semantic search over the financial knowledge base.
pub struct RetrieveDocumentsUseCase {
    index: Arc<VectorIndex>,
}

impl RetrieveDocumentsUseCase {
    pub const DEFAULT_K: usize = 5;

    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index }
    }

    /// Return the top `k` passages as citation-tagged blocks, nearest
    /// first. Zero results is a valid answer state and yields an empty
    /// string, not an error.
    pub fn execute(&self, query: &str, k: usize) -> Result<String, AgentError> {
        let chunks = self.index.search(query, k)?;
        if chunks.is_empty() {
            return Ok(String::new());
        }

        let passages: Vec<String> = chunks
            .iter()
            .map(|c| format!("[Source: {}, Page: {}]\n{}", c.source_file, c.page, c.content))
            .collect();
        Ok(passages.join(BLOCK_SEPARATOR))
    }
}
