//! Embedding backend errors.

use thiserror::Error;

/// Error returned by an embedding backend.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding failed: {0}")]
    Failed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
