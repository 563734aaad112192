//! Configured hybrid ranking.

use mnemo_config::{FusionStrategy, ScoringConfig};
use mnemo_protocols::ScoredCandidate;
use tracing::debug;

use crate::bm25::calculate_scores;
use crate::fusion::{fuse_with_rrf, fuse_with_weights};

/// Scores a candidate set and fuses it with the configured strategy.
#[derive(Debug, Clone, Default)]
pub struct HybridScorer {
    config: ScoringConfig,
}

impl HybridScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank `candidates` against `query`, best first.
    pub fn rank(&self, candidates: Vec<ScoredCandidate>, query: &str) -> Vec<ScoredCandidate> {
        let total = candidates.len();
        let scored = calculate_scores(candidates, query, &self.config.bm25);

        let fusion = &self.config.fusion;
        let ranked = match fusion.strategy {
            FusionStrategy::Rrf => fuse_with_rrf(scored, fusion.rrf_k, fusion.min_semantic_score),
            FusionStrategy::Weighted => {
                fuse_with_weights(scored, fusion.semantic_weight, fusion.bm25_weight)
            }
        };

        debug!(
            "Ranked {} of {} candidates with {:?} fusion",
            ranked.len(),
            total,
            fusion.strategy
        );
        ranked
    }
}
