//! Request coordinator errors.

use std::time::Duration;

use thiserror::Error;

use super::EmbeddingError;

/// Error surfaced to a caller of the request coordinator.
///
/// Cloneable so that a failed batch can hand the same error to every member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// The circuit breaker is open; no backend call was attempted.
    #[error("Circuit open: embedding backend is unavailable")]
    CircuitOpen,

    /// No rate limiter token was available at admission.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The request exceeded its caller-supplied budget.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The embedding backend itself failed.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The coordinator is no longer accepting work.
    #[error("Coordinator shutting down")]
    Shutdown,
}

impl CoordinatorError {
    /// Whether this error came from the backend rather than from admission control.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

impl From<EmbeddingError> for CoordinatorError {
    fn from(err: EmbeddingError) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_open_display() {
        let err = CoordinatorError::CircuitOpen;
        assert!(err.to_string().contains("Circuit open"));
    }

    #[test]
    fn test_timeout_display() {
        let err = CoordinatorError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_from_embedding_error() {
        let err: CoordinatorError = EmbeddingError::Failed("boom".to_string()).into();
        assert!(err.is_backend_failure());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_admission_errors_are_not_backend_failures() {
        assert!(!CoordinatorError::CircuitOpen.is_backend_failure());
        assert!(!CoordinatorError::RateLimitExceeded.is_backend_failure());
        assert!(!CoordinatorError::Shutdown.is_backend_failure());
    }

    #[test]
    fn test_clone_preserves_variant() {
        let err = CoordinatorError::Backend("down".to_string());
        assert_eq!(err.clone(), err);
    }
}
