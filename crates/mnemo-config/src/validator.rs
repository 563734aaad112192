//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{CollectionBackendKind, Config, EmbeddingProviderKind};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::invalid_value(error.path, error.message)),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_coordinator(config, &mut result);
        Self::validate_scoring(config, &mut result);
        Self::validate_store(config, &mut result);
        Self::validate_embedding(config, &mut result);
        Self::validate_collection(config, &mut result);

        result
    }

    fn validate_coordinator(config: &Config, result: &mut ValidationResult) {
        let coordinator = &config.coordinator;

        if coordinator.max_concurrent == 0 {
            result.add_error(ValidationError::new(
                "coordinator.max_concurrent",
                "max_concurrent must be greater than 0",
            ));
        }

        if !coordinator.rate_limit_per_second.is_finite() || coordinator.rate_limit_per_second <= 0.0 {
            result.add_error(ValidationError::new(
                "coordinator.rate_limit_per_second",
                "rate_limit_per_second must be a positive number",
            ));
        } else if coordinator.rate_limit_per_second < 1.0 {
            result.add_warning(ValidationWarning::new(
                "coordinator.rate_limit_per_second",
                "rate_limit_per_second below 1 means bursts of a single request at most",
            ));
        }

        if coordinator.circuit_failure_threshold == 0 {
            result.add_error(ValidationError::new(
                "coordinator.circuit_failure_threshold",
                "circuit_failure_threshold must be greater than 0",
            ));
        }

        if coordinator.batch_size == 0 {
            result.add_error(ValidationError::new(
                "coordinator.batch_size",
                "batch_size must be greater than 0",
            ));
        }

        if coordinator.default_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "coordinator.default_timeout_ms",
                "default_timeout_ms must be greater than 0",
            ));
        }

        if coordinator.batch_timeout_ms >= coordinator.default_timeout_ms {
            result.add_warning(ValidationWarning::new(
                "coordinator.batch_timeout_ms",
                "batch_timeout_ms is not below default_timeout_ms, batched requests may time out",
            ));
        }
    }

    fn validate_scoring(config: &Config, result: &mut ValidationResult) {
        let bm25 = &config.scoring.bm25;
        let fusion = &config.scoring.fusion;

        if !(bm25.k1 >= 0.0) {
            result.add_error(ValidationError::new("scoring.bm25.k1", "k1 must be non-negative"));
        }

        if !(0.0..=1.0).contains(&bm25.b) {
            result.add_error(ValidationError::new("scoring.bm25.b", "b must be within [0, 1]"));
        }

        if let Some(k) = fusion.rrf_k {
            if !(k > 0.0) {
                result.add_error(ValidationError::new(
                    "scoring.fusion.rrf_k",
                    "rrf_k must be positive",
                ));
            }
        }

        for (path, value) in [
            ("scoring.fusion.min_semantic_score", fusion.min_semantic_score),
            ("scoring.fusion.semantic_weight", fusion.semantic_weight),
            ("scoring.fusion.bm25_weight", fusion.bm25_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(path, "value must be within [0, 1]"));
            }
        }

        if (fusion.semantic_weight + fusion.bm25_weight - 1.0).abs() > 1e-3 {
            result.add_warning(ValidationWarning::new(
                "scoring.fusion",
                "semantic_weight and bm25_weight do not sum to 1",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        if config.store.candidate_multiplier == 0 {
            result.add_warning(ValidationWarning::new(
                "store.candidate_multiplier",
                "candidate_multiplier of 0 is treated as 1, fusion cannot re-rank beyond max_results",
            ));
        }
    }

    fn validate_embedding(config: &Config, result: &mut ValidationResult) {
        let embedding = &config.embedding;

        if embedding.dimension == 0 {
            result.add_error(ValidationError::new(
                "embedding.dimension",
                "dimension must be greater than 0",
            ));
        }

        if embedding.provider == EmbeddingProviderKind::OpenAi {
            if embedding.api_key.as_deref().is_none_or(str::is_empty) {
                result.add_warning(ValidationWarning::new(
                    "embedding.api_key",
                    "API key is not set, requests to the embedding API will be rejected",
                ));
            }

            if !embedding.base_url.starts_with("http://") && !embedding.base_url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "embedding.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }
    }

    fn validate_collection(config: &Config, result: &mut ValidationResult) {
        match config.collection.backend {
            CollectionBackendKind::Memory => {
                result.add_warning(ValidationWarning::new(
                    "collection.backend",
                    "in-memory collection selected, facts are lost on restart",
                ));
            }
            CollectionBackendKind::Sqlite => {
                if config.collection.path.as_os_str().is_empty() {
                    result.add_error(ValidationError::new(
                        "collection.path",
                        "SQLite collection requires a path",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
