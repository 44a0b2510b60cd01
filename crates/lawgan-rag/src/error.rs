use std::path::PathBuf;

use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("configured source {path} cannot be read: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("embedding failed: {0}")]
    Embedding(#[from] lawgan_llm::LlmError),

    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error(
        "index vector width {indexed} does not match the active embedding model width {active}; \
         delete the collection and rebuild"
    )]
    DimensionMismatch { indexed: u64, active: u64 },
}
