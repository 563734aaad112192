//! Fact store errors.

use std::fmt;

use thiserror::Error;

use super::{CollectionError, CoordinatorError};

/// The fact store operation during which a coordinator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Store,
    Update,
    Supersede,
    Query,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Store => "store",
            Self::Update => "update",
            Self::Supersede => "supersede",
            Self::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid fact: {0}")]
    Validation(String),

    #[error("Fact not found: {0}")]
    NotFound(String),

    #[error("Fact is immutable and cannot be updated in place: {0}")]
    ImmutableFact(String),

    #[error("{operation} failed: {source}")]
    Coordinator {
        operation: StoreOperation,
        #[source]
        source: CoordinatorError,
    },

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn coordinator(operation: StoreOperation, source: CoordinatorError) -> Self {
        Self::Coordinator { operation, source }
    }

    /// The underlying coordinator error, if this failure came from the coordinator.
    pub fn coordinator_error(&self) -> Option<&CoordinatorError> {
        match self {
            Self::Coordinator { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_error_annotated_with_operation() {
        let err = StoreError::coordinator(StoreOperation::Query, CoordinatorError::CircuitOpen);
        let display = err.to_string();
        assert!(display.starts_with("query failed"));
        assert!(display.contains("Circuit open"));
        assert_eq!(err.coordinator_error(), Some(&CoordinatorError::CircuitOpen));
    }

    #[test]
    fn test_collection_error_from() {
        let err: StoreError = CollectionError::Storage("io".to_string()).into();
        assert!(matches!(err, StoreError::Collection(_)));
        assert!(err.coordinator_error().is_none());
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(StoreOperation::Store.to_string(), "store");
        assert_eq!(StoreOperation::Supersede.to_string(), "supersede");
    }
}
