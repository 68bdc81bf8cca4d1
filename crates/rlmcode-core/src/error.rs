/// Unified error type for rlm-code.
#[derive(Debug, thiserror::Error)]
pub enum RlmError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Invalid symbol kind: {0}")]
    InvalidSymbolKind(String),

    #[error("Invalid edge kind: {0}")]
    InvalidEdgeKind(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
