use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use stock_core::AgentError;

/// Embedding backend used by the vector index.
///
/// The same embedder must be used for indexing and querying or similarity
/// scores are meaningless; the index enforces this by persisting `id()` and
/// refusing to load under a different embedder.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the embedding model, persisted with the index.
    fn id(&self) -> &str;
    fn dimension(&self) -> usize;
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AgentError>;
}

/// Production embedder backed by fastembed's BGE-small-en-v1.5 (384 dims).
pub struct FastembedEmbedder {
    model: TextEmbedding,
}

impl FastembedEmbedder {
    pub const MODEL_ID: &'static str = "bge-small-en-v1.5";
    pub const DIMENSION: usize = 384;

    /// Downloads the ONNX model on first use.
    pub fn new() -> Result<Self, AgentError> {
        tracing::info!("Loading embedding model ({})...", Self::MODEL_ID);
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(true),
        )
        .map_err(|e| AgentError::Embedding(e.to_string()))?;
        Ok(Self { model })
    }
}

impl Embedder for FastembedEmbedder {
    fn id(&self) -> &str {
        Self::MODEL_ID
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AgentError> {
        self.model
            .embed(texts, None)
            .map_err(|e| AgentError::Embedding(e.to_string()))
    }
}

/// Deterministic bag-of-words hashing embedder. No model download, no
/// network; similarity tracks token overlap. Used by tests and offline
/// smoke runs, never for production indexes.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dimension: 64 }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str {
        "hash-v1"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AgentError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl HashEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let bucket = fnv1a(token) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
