//! Per-query ranking candidates.

use serde::{Deserialize, Serialize};

use crate::collection::CollectionHit;
use crate::types::Metadata;

/// A candidate produced by nearest-neighbour search and scored for fusion.
///
/// Candidates live for a single query and are never persisted: BM25
/// statistics are relative to the candidate set they were computed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Raw distance reported by the collection.
    pub distance: f32,
    /// Distance mapped into a [0, 1] similarity.
    pub semantic_score: f32,
    /// Corpus-relative BM25 score.
    pub bm25_score: f32,
    /// Set by reciprocal rank fusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrf_score: Option<f32>,
    /// Set by weighted fusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_score: Option<f32>,
}

impl ScoredCandidate {
    pub fn new(id: impl Into<String>, content: impl Into<String>, distance: f32) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            distance,
            semantic_score: 0.0,
            bm25_score: 0.0,
            rrf_score: None,
            hybrid_score: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The final ranking score: the fused score if fusion ran, else the semantic score.
    pub fn score(&self) -> f32 {
        self.rrf_score
            .or(self.hybrid_score)
            .unwrap_or(self.semantic_score)
    }
}

impl From<CollectionHit> for ScoredCandidate {
    fn from(hit: CollectionHit) -> Self {
        Self::new(hit.id, hit.document, hit.distance).with_metadata(hit.metadata)
    }
}
