use std::fs;
use std::path::Path;

use stock_core::AgentError;

/// Text of one page of a source document.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Zero-based page number
    pub page: u32,
    pub text: String,
}

/// Seam between the ingestion pipeline and concrete document formats.
pub trait DocumentLoader: Send + Sync {
    /// Load a document and return its pages in order.
    ///
    /// Fails with `SourceUnavailable` when the source cannot be fetched or
    /// parsed; a missing source is never skipped silently.
    fn load(&self, source: &str) -> Result<Vec<PageText>, AgentError>;
}

/// Loads pre-extracted UTF-8 text documents from the local filesystem.
/// Pages are delimited by form-feed characters; a document without any
/// form feed is a single page 0.
pub struct TextDocumentLoader;

const PAGE_BREAK: char = '\u{0C}';

impl DocumentLoader for TextDocumentLoader {
    fn load(&self, source: &str) -> Result<Vec<PageText>, AgentError> {
        let path = Path::new(source);
        let raw = fs::read_to_string(path).map_err(|e| {
            AgentError::SourceUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let pages: Vec<PageText> = raw
            .split(PAGE_BREAK)
            .enumerate()
            .map(|(idx, text)| PageText {
                page: idx as u32,
                text: text.to_string(),
            })
            .filter(|p| !p.text.trim().is_empty())
            .collect();

        tracing::debug!(source, pages = pages.len(), "loaded document");
        Ok(pages)
    }
}
