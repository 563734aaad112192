//! # Mnemo Scoring
//!
//! Pure, stateless ranking functions over a fixed candidate set.
//!
//! - [`tokenize`] - lowercase alphanumeric tokens
//! - [`calculate_scores`] - semantic similarity and corpus-relative BM25
//! - [`fuse_with_rrf`] / [`fuse_with_weights`] - the two fusion strategies
//! - [`HybridScorer`] - scoring followed by the configured fusion

mod bm25;
mod fusion;
mod scorer;
mod tokenizer;

pub use bm25::{calculate_scores, semantic_score};
pub use fusion::{adaptive_k, fuse_with_rrf, fuse_with_weights};
pub use scorer::HybridScorer;
pub use tokenizer::tokenize;
