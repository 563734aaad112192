//! Hybrid scoring configuration types (BM25 and fusion).

use serde::{Deserialize, Serialize};

/// Scoring configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub bm25: Bm25Config,

    #[serde(default)]
    pub fusion: FusionConfig,
}

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Config {
    /// Term-frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f32,

    /// Length normalization.
    #[serde(default = "default_b")]
    pub b: f32,

    /// Query terms with a lower IDF over the candidate set are ignored.
    #[serde(default = "default_min_idf")]
    pub min_idf: f32,
}

fn default_k1() -> f32 {
    1.5
}

fn default_b() -> f32 {
    0.75
}

fn default_min_idf() -> f32 {
    0.1
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
            min_idf: default_min_idf(),
        }
    }
}

/// How semantic and lexical scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionStrategy {
    /// Reciprocal rank fusion.
    Rrf,
    /// Weighted sum of semantic and min-max normalized BM25 scores.
    Weighted,
}

impl Default for FusionStrategy {
    fn default() -> Self {
        Self::Rrf
    }
}

/// Fusion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub strategy: FusionStrategy,

    /// Fixed RRF constant. Chosen from the candidate count when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrf_k: Option<f32>,

    /// Candidates below this semantic score are dropped before RRF.
    #[serde(default = "default_min_semantic_score")]
    pub min_semantic_score: f32,

    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    #[serde(default = "default_bm25_weight")]
    pub bm25_weight: f32,
}

fn default_min_semantic_score() -> f32 {
    0.35
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_bm25_weight() -> f32 {
    0.3
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            strategy: FusionStrategy::default(),
            rrf_k: None,
            min_semantic_score: default_min_semantic_score(),
            semantic_weight: default_semantic_weight(),
            bm25_weight: default_bm25_weight(),
        }
    }
}

impl FusionConfig {
    /// Weighted fusion with the given weights.
    pub fn weighted(semantic_weight: f32, bm25_weight: f32) -> Self {
        Self {
            strategy: FusionStrategy::Weighted,
            semantic_weight,
            bm25_weight,
            ..Self::default()
        }
    }
}
