//! Result fusion algorithms.

use std::cmp::Ordering;

use mnemo_protocols::ScoredCandidate;

/// RRF constant chosen from the number of candidates being fused.
///
/// Small sets get a small `k` so rank differences matter; large sets converge
/// on the customary 60. Non-decreasing in `n`.
pub fn adaptive_k(n: usize) -> f32 {
    match n {
        0..50 => (n as f32 / 2.0).max(10.0),
        50..500 => 30.0 + 30.0 * (n - 50) as f32 / 450.0,
        _ => 60.0,
    }
}

/// Reciprocal Rank Fusion over semantic and BM25 ranks.
///
/// Candidates below `min_semantic_score` are discarded first. Each survivor
/// scores `1/(k + semantic_rank) + 1/(k + bm25_rank)` with 1-indexed ranks;
/// `k` defaults to [`adaptive_k`] of the survivor count.
pub fn fuse_with_rrf(
    candidates: Vec<ScoredCandidate>,
    k: Option<f32>,
    min_semantic_score: f32,
) -> Vec<ScoredCandidate> {
    let mut survivors: Vec<ScoredCandidate> = candidates
        .into_iter()
        .filter(|c| c.semantic_score >= min_semantic_score)
        .collect();

    if survivors.is_empty() {
        return survivors;
    }

    let k = k.unwrap_or_else(|| adaptive_k(survivors.len()));
    let semantic_ranks = ranks(&survivors, |c| c.semantic_score);
    let bm25_ranks = ranks(&survivors, |c| c.bm25_score);

    for (i, candidate) in survivors.iter_mut().enumerate() {
        let score = 1.0 / (k + semantic_ranks[i] as f32) + 1.0 / (k + bm25_ranks[i] as f32);
        candidate.rrf_score = Some(score);
    }

    survivors.sort_by(|a, b| descending(a.rrf_score, b.rrf_score));
    survivors
}

/// Weighted sum of the semantic score and min-max normalized BM25.
///
/// No semantic floor is applied. More sensitive to skewed score
/// distributions than [`fuse_with_rrf`].
pub fn fuse_with_weights(
    mut candidates: Vec<ScoredCandidate>,
    semantic_weight: f32,
    bm25_weight: f32,
) -> Vec<ScoredCandidate> {
    let normalized = min_max(candidates.iter().map(|c| c.bm25_score));

    for (candidate, bm25) in candidates.iter_mut().zip(normalized) {
        candidate.hybrid_score = Some(semantic_weight * candidate.semantic_score + bm25_weight * bm25);
    }

    candidates.sort_by(|a, b| descending(a.hybrid_score, b.hybrid_score));
    candidates
}

/// 1-indexed rank of each candidate by `key`, descending. Ties keep input order.
fn ranks(candidates: &[ScoredCandidate], key: impl Fn(&ScoredCandidate) -> f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        key(&candidates[b])
            .partial_cmp(&key(&candidates[a]))
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0; candidates.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Scale values into [0, 1]. A degenerate range maps to 1.0 if the shared
/// value is positive, else 0.0.
fn min_max(values: impl Iterator<Item = f32> + Clone) -> Vec<f32> {
    let (min, max) = values
        .clone()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;

    values
        .map(|v| {
            if range > f32::EPSILON {
                (v - min) / range
            } else if v > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn descending(a: Option<f32>, b: Option<f32>) -> Ordering {
    b.unwrap_or(0.0)
        .partial_cmp(&a.unwrap_or(0.0))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
#[path = "fusion_tests.rs"]
mod tests;
