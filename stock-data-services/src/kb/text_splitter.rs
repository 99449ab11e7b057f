use stock_core::DocumentChunk;

use super::document_loader::PageText;

/// Chunking policy, supplied by the caller. The defaults match the
/// knowledge-base ingestion policy; the splitter itself has no opinion.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Trailing characters repeated at the start of the next chunk
    pub chunk_overlap: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Boundary candidates in descending priority: paragraph break, line break,
/// sentence end, word break. A hard character cut is the last resort.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Recursive character splitter.
///
/// Cuts text into chunks of at most `chunk_size` characters, preferring the
/// highest-priority separator that keeps a piece within budget and falling
/// down the priority list only when it has to. Consecutive chunks share
/// `chunk_overlap` characters of trailing context.
pub struct TextSplitter {
    config: SplitConfig,
}

impl TextSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Split the pages of one document into chunks.
    ///
    /// Each chunk inherits the page number of the page it was cut from;
    /// `chunk_id` is a zero-based counter in emission order, unique within
    /// this call.
    pub fn split_document(&self, source_file: &str, pages: &[PageText]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        let mut chunk_id: u32 = 0;

        for page in pages {
            for piece in self.split_text(&page.text) {
                chunks.push(DocumentChunk::new(piece, source_file, page.page, chunk_id));
                chunk_id += 1;
            }
        }

        tracing::debug!(
            source_file,
            pages = pages.len(),
            chunks = chunks.len(),
            "split document"
        );
        chunks
    }

    /// Split a single text into overlapping pieces of bounded size.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let segments = self.segment(text, 0);
        self.merge(segments)
    }

    /// Recursively cut `text` into segments no longer than `chunk_size`
    /// characters, trying separators in priority order.
    fn segment(&self, text: &str, sep_idx: usize) -> Vec<String> {
        if char_len(text) <= self.config.chunk_size {
            return vec![text.to_string()];
        }
        if sep_idx >= SEPARATORS.len() {
            return hard_cut(text, self.config.chunk_size);
        }

        let sep = SEPARATORS[sep_idx];
        if !text.contains(sep) {
            return self.segment(text, sep_idx + 1);
        }

        let mut segments = Vec::new();
        for piece in text.split_inclusive(sep) {
            if char_len(piece) <= self.config.chunk_size {
                segments.push(piece.to_string());
            } else {
                segments.extend(self.segment(piece, sep_idx + 1));
            }
        }
        segments
    }

    /// Greedily merge segments into chunks within the size budget, seeding
    /// each new chunk with the trailing overlap of the previous one.
    fn merge(&self, segments: Vec<String>) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for segment in segments {
            if !current.is_empty()
                && char_len(&current) + char_len(&segment) > self.config.chunk_size
            {
                let overlap = tail_chars(&current, self.config.chunk_overlap);
                push_chunk(&mut chunks, &current);
                current = overlap;
            }
            current.push_str(&segment);
        }
        push_chunk(&mut chunks, &current);

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`, respecting char boundaries.
fn tail_chars(s: &str, n: usize) -> String {
    let len = char_len(s);
    if len <= n {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|c| c.iter().collect::<String>())
        .collect()
}
