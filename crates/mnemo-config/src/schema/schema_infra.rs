//! Infrastructure configuration types (store, embedding backend, collection, logging).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fact store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Candidates fetched per requested result, to give fusion room to re-rank.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Lower bound on the candidate pool size.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
}

fn default_candidate_multiplier() -> usize {
    3
}

fn default_min_candidates() -> usize {
    20
}

impl StoreConfig {
    /// Number of candidates to fetch for a query returning `max_results`.
    pub fn candidate_pool(&self, max_results: usize) -> usize {
        max_results
            .saturating_mul(self.candidate_multiplier.max(1))
            .max(self.min_candidates)
            .max(max_results)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            candidate_multiplier: default_candidate_multiplier(),
            min_candidates: default_min_candidates(),
        }
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings` HTTP API.
    OpenAi,
    /// Offline feature-hashing embeddings.
    Hashing,
}

impl Default for EmbeddingProviderKind {
    fn default() -> Self {
        Self::OpenAi
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// API key (supports `${VAR}` expansion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_dimension() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            dimension: default_dimension(),
        }
    }
}

/// Vector collection selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionBackendKind {
    Memory,
    Sqlite,
}

impl Default for CollectionBackendKind {
    fn default() -> Self {
        Self::Sqlite
    }
}

/// Vector collection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub backend: CollectionBackendKind,

    /// Database path for the SQLite collection.
    #[serde(default = "default_collection_path")]
    pub path: PathBuf,
}

fn default_collection_path() -> PathBuf {
    PathBuf::from("mnemo.db")
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            backend: CollectionBackendKind::default(),
            path: default_collection_path(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Pretty
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
