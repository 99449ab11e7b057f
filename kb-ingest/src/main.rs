use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stock_data_services::{
    FastembedEmbedder, IngestionPipeline, SplitConfig, TextDocumentLoader, TextSplitter,
    VectorIndex,
};
use tracing::{info, Level};

/// Knowledge Base Ingestion CLI
///
/// Loads financial documents, splits them into overlapping chunks,
/// generates embeddings, and persists the vector index used by the
/// agent's document-retrieval tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document sources to ingest (comma-separated paths)
    #[arg(short = 's', long, value_delimiter = ',', required = true)]
    sources: Vec<String>,

    /// Directory where the vector index will be persisted
    #[arg(short = 'o', long, default_value = "vectorstore")]
    index_dir: PathBuf,

    /// Maximum characters per chunk
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Characters of trailing context repeated between chunks
    #[arg(long, default_value = "200")]
    chunk_overlap: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Parse log level from string
    fn parse_log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(args.parse_log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Knowledge Base Ingestion Tool");
    info!("=============================");
    info!("Configuration:");
    info!("  Sources: {:?}", args.sources);
    info!("  Index dir: {}", args.index_dir.display());
    info!(
        "  Chunking: size={} overlap={}",
        args.chunk_size, args.chunk_overlap
    );
    info!("");

    // Embedding is CPU-bound and the pipeline is synchronous end to end;
    // run it off the async runtime's worker threads
    let stats = tokio::task::spawn_blocking(move || -> Result<_> {
        let embedder = Arc::new(FastembedEmbedder::new().context("Failed to load embedding model")?);
        let splitter = TextSplitter::new(SplitConfig {
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
        });
        let index = VectorIndex::new(embedder);

        let mut pipeline = IngestionPipeline::new(Box::new(TextDocumentLoader), splitter, index);
        pipeline
            .ingest(&args.sources, &args.index_dir)
            .context("Ingestion failed")
    })
    .await??;

    info!(
        "Ingestion complete: {} chunks from {} documents indexed.",
        stats.chunks_indexed, stats.documents_loaded
    );
    Ok(())
}
