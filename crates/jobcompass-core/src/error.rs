//! Error types for the retrieval core

use thiserror::Error;

/// Result type alias using [`CoreError`]
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type alias for convenience
pub type Error = CoreError;

/// Main error type for the retrieval core.
///
/// Subsystem-internal degradations (expansion/HyDE/rerank timing out, a
/// single bad mapping entry) are logged and absorbed by the subsystem
/// itself; they never reach this type. Only the fatal cases in the
/// propagation policy surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("company mapping file missing or unreadable: {0}")]
    MappingMissing(String),

    #[error("no embedding backend configured")]
    NoEmbeddingBackend,

    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    #[error("LLM gateway error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Exit-code-style classification for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::MappingMissing(_) | Self::InvalidInput(_) => 3,
            Self::NoEmbeddingBackend | Self::VectorStoreUnavailable(_) => 2,
            _ => 1,
        }
    }
}
