use serde::{Deserialize, Serialize};

/// A bounded slice of source document text with page and source provenance.
/// This is the unit indexed for retrieval; it is created once by the
/// chunking pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    pub source_file: String,
    pub page: u32,
    /// Zero-based emission counter, unique within one ingestion run.
    pub chunk_id: u32,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, source_file: impl Into<String>, page: u32, chunk_id: u32) -> Self {
        Self {
            content: content.into(),
            source_file: source_file.into(),
            page,
            chunk_id,
        }
    }
}
