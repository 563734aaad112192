//! Request and response types.

use std::time::Duration;

use mnemo_protocols::{CoordinatorError, Embedding, RequestPriority};

/// Work submitted to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Embed a single text.
    Embed(String),
    /// Embed several texts, preserving order.
    EmbedBatch(Vec<String>),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Embed(_) => OperationKind::Embed,
            Self::EmbedBatch(_) => OperationKind::EmbedBatch,
        }
    }

    pub(crate) fn into_texts(self) -> Vec<String> {
        match self {
            Self::Embed(text) => vec![text],
            Self::EmbedBatch(texts) => texts,
        }
    }
}

/// Batching key: only requests of the same kind are coalesced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Embed,
    EmbedBatch,
}

/// A request to the coordinator.
#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub operation: Operation,
    pub priority: RequestPriority,
    /// Total time the caller is willing to wait. Falls back to the configured default.
    pub timeout: Option<Duration>,
}

impl EmbeddingRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            priority: RequestPriority::default(),
            timeout: None,
        }
    }

    pub fn embed(text: impl Into<String>) -> Self {
        Self::new(Operation::Embed(text.into()))
    }

    pub fn embed_batch(texts: Vec<String>) -> Self {
        Self::new(Operation::EmbedBatch(texts))
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutput {
    Single(Embedding),
    Batch(Vec<Embedding>),
}

impl EmbeddingOutput {
    pub fn into_single(self) -> Result<Embedding, CoordinatorError> {
        match self {
            Self::Single(embedding) => Ok(embedding),
            Self::Batch(mut embeddings) if embeddings.len() == 1 => Ok(embeddings.remove(0)),
            Self::Batch(embeddings) => Err(CoordinatorError::Backend(format!(
                "expected a single embedding, got {}",
                embeddings.len()
            ))),
        }
    }

    pub fn into_batch(self) -> Vec<Embedding> {
        match self {
            Self::Single(embedding) => vec![embedding],
            Self::Batch(embeddings) => embeddings,
        }
    }
}
