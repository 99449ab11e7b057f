use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stock_core::{AgentError, DocumentChunk};

use super::embedder::Embedder;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    vector: Vec<f32>,
    chunk: DocumentChunk,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    embedder_id: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// Flat in-process vector index over document chunks.
///
/// Lifecycle: `new` → `add` (repeatable, accumulating) → `persist`, or
/// `load` → `search`. Searching before `add`/`load` is a `NotLoaded` error;
/// an index that has been primed but holds no entries answers every query
/// with an empty result instead.
///
/// After loading, the index is immutable and safe to share behind an `Arc`
/// across concurrently searching runs.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: Option<Vec<IndexEntry>>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embedder", &self.embedder.id())
            .field("entries", &self.entries.as_ref().map(|e| e.len()))
            .finish()
    }
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: None,
        }
    }

    /// Embed and insert chunks. Re-adding identical content creates a
    /// second entry; deduplication is the caller's concern.
    pub fn add(&mut self, chunks: &[DocumentChunk]) -> Result<(), AgentError> {
        if chunks.is_empty() {
            self.entries.get_or_insert_with(Vec::new);
            return Ok(());
        }

        tracing::info!("Embedding {} chunks with {}...", chunks.len(), self.embedder.id());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed(texts)?;

        let entries = self.entries.get_or_insert_with(Vec::new);
        for (vector, chunk) in vectors.into_iter().zip(chunks.iter().cloned()) {
            entries.push(IndexEntry { vector, chunk });
        }
        Ok(())
    }

    /// Serialize vectors and chunk metadata into a directory at `path`.
    pub fn persist(&self, path: &Path) -> Result<(), AgentError> {
        let entries = self.entries.as_ref().ok_or(AgentError::NotIndexed)?;

        fs::create_dir_all(path)?;
        let persisted = PersistedIndex {
            embedder_id: self.embedder.id().to_string(),
            dimension: self.embedder.dimension(),
            entries: entries.clone(),
        };
        let file = fs::File::create(path.join(INDEX_FILE))?;
        serde_json::to_writer(file, &persisted)?;

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "vector index persisted"
        );
        Ok(())
    }

    /// Reconstruct a previously persisted index, ready for querying.
    pub fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, AgentError> {
        let file = path.join(INDEX_FILE);
        let raw = fs::read_to_string(&file)
            .map_err(|_| AgentError::IndexNotFound(path.display().to_string()))?;
        let persisted: PersistedIndex = serde_json::from_str(&raw)
            .map_err(|_| AgentError::IndexNotFound(path.display().to_string()))?;

        if persisted.embedder_id != embedder.id() {
            return Err(AgentError::Embedding(format!(
                "index at {} was built with embedder '{}', cannot query it with '{}'",
                path.display(),
                persisted.embedder_id,
                embedder.id()
            )));
        }

        tracing::info!(
            path = %path.display(),
            entries = persisted.entries.len(),
            "vector index loaded"
        );
        Ok(Self {
            embedder,
            entries: Some(persisted.entries),
        })
    }

    /// Return the `k` chunks nearest to `query`, ordered nearest-first.
    /// Returns fewer than `k` when the index holds fewer entries.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, AgentError> {
        let entries = self.entries.as_ref().ok_or(AgentError::NotLoaded)?;
        if entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(vec![query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Embedding("empty embedding for query".to_string()))?;

        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&query_vector, &e.vector), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, e)| e.chunk.clone())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::embedder::HashEmbedder;

    fn chunk(content: &str, id: u32) -> DocumentChunk {
        DocumentChunk::new(content, "report.txt", 0, id)
    }

    #[test]
    fn test_search_before_add_or_load_fails() {
        let index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        let err = index.search("revenue", 3).unwrap_err();
        assert!(matches!(err, AgentError::NotLoaded));
    }

    #[test]
    fn test_persist_before_add_fails() {
        let index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        let err = index.persist(Path::new("/tmp/never-created")).unwrap_err();
        assert!(matches!(err, AgentError::NotIndexed));
    }

    #[test]
    fn test_load_missing_path_fails() {
        let err =
            VectorIndex::load(Path::new("/nonexistent/index"), Arc::new(HashEmbedder::new()))
                .unwrap_err();
        assert!(matches!(err, AgentError::IndexNotFound(_)));
    }

    #[test]
    fn test_empty_index_answers_with_empty_results() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        index.add(&[]).unwrap();
        assert_eq!(index.search("anything", 5).unwrap(), Vec::new());
    }

    #[test]
    fn test_nearest_first_ordering() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        index
            .add(&[
                chunk("aws cloud revenue grew strongly", 0),
                chunk("board of directors compensation table", 1),
                chunk("aws cloud revenue and operating income", 2),
            ])
            .unwrap();

        let results = index.search("aws cloud revenue", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_ne!(results[0].chunk_id, 1);
        assert_ne!(results[1].chunk_id, 1);
    }

    #[test]
    fn test_fewer_entries_than_k() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        index.add(&[chunk("guidance for the fourth quarter", 0)]).unwrap();
        assert_eq!(index.search("guidance", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_accumulating_adds_without_dedup() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()));
        index.add(&[chunk("same content", 0)]).unwrap();
        index.add(&[chunk("same content", 0)]).unwrap();
        assert_eq!(index.len(), 2);
    }
}
