use thiserror::Error;

/// Error taxonomy shared across the agent workspace.
///
/// Caller-input and lifecycle errors are surfaced immediately and never
/// retried. Errors raised inside a tool's backend call are converted to
/// in-band `{"error": ...}` content at the tool boundary and never reach
/// this type from inside a run; errors of the run itself (unknown tool,
/// recursion limit) terminate the run.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("no index found at {0}")]
    IndexNotFound(String),

    #[error("no documents indexed")]
    NotIndexed,

    #[error("vector index not loaded")]
    NotLoaded,

    #[error("no data available: {0}")]
    DataUnavailable(String),

    #[error("unknown tool requested by model: {0}")]
    UnknownTool(String),

    #[error("recursion limit of {0} model calls exceeded")]
    RecursionLimitExceeded(u32),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("language model error: {0}")]
    Model(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
