//! Semantic and BM25 scoring over a candidate set.
//!
//! The candidate set is its own corpus: document frequencies and the average
//! document length are recomputed on every call and never cached.

use std::collections::{HashMap, HashSet};

use mnemo_config::Bm25Config;
use mnemo_protocols::ScoredCandidate;

use crate::tokenizer::tokenize;

/// Map a cosine distance in [0, 2] to a similarity in [0, 1].
pub fn semantic_score(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

/// Fill in `semantic_score` and `bm25_score` for every candidate.
pub fn calculate_scores(
    mut candidates: Vec<ScoredCandidate>,
    query: &str,
    params: &Bm25Config,
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let documents: Vec<Vec<String>> = candidates.iter().map(|c| tokenize(&c.content)).collect();
    let scores = bm25_scores(&documents, query, params);

    for (candidate, bm25) in candidates.iter_mut().zip(scores) {
        candidate.semantic_score = semantic_score(candidate.distance);
        candidate.bm25_score = bm25;
    }

    candidates
}

fn bm25_scores(documents: &[Vec<String>], query: &str, params: &Bm25Config) -> Vec<f32> {
    let n = documents.len() as f32;
    let total_length: usize = documents.iter().map(Vec::len).sum();
    let avgdl = total_length as f32 / n;

    let term_frequencies: Vec<HashMap<&str, u32>> = documents
        .iter()
        .map(|tokens| {
            let mut tf = HashMap::new();
            for token in tokens {
                *tf.entry(token.as_str()).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut seen = HashSet::new();
    let weighted_terms: Vec<(String, f32)> = tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .filter_map(|term| {
            let df = term_frequencies
                .iter()
                .filter(|tf| tf.contains_key(term.as_str()))
                .count() as f32;
            if df == 0.0 {
                return None;
            }
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            (idf >= params.min_idf).then_some((term, idf))
        })
        .collect();

    documents
        .iter()
        .zip(&term_frequencies)
        .map(|(tokens, tf)| {
            let length_ratio = if avgdl > 0.0 {
                tokens.len() as f32 / avgdl
            } else {
                0.0
            };
            let norm = params.k1 * (1.0 - params.b + params.b * length_ratio);

            weighted_terms
                .iter()
                .map(|(term, idf)| {
                    let tf = tf.get(term.as_str()).copied().unwrap_or(0) as f32;
                    if tf == 0.0 {
                        0.0
                    } else {
                        idf * (tf * (params.k1 + 1.0)) / (tf + norm)
                    }
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
#[path = "bm25_tests.rs"]
mod tests;
