use super::*;

fn scored(id: &str, semantic: f32, bm25: f32) -> ScoredCandidate {
    let mut candidate = ScoredCandidate::new(id, id, 2.0 * (1.0 - semantic));
    candidate.semantic_score = semantic;
    candidate.bm25_score = bm25;
    candidate
}

fn ids(candidates: &[ScoredCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn test_adaptive_k_bands() {
    assert_eq!(adaptive_k(0), 10.0);
    assert_eq!(adaptive_k(10), 10.0);
    assert_eq!(adaptive_k(40), 20.0);
    assert_eq!(adaptive_k(50), 30.0);
    assert_eq!(adaptive_k(275), 45.0);
    assert_eq!(adaptive_k(500), 60.0);
    assert_eq!(adaptive_k(10_000), 60.0);
}

#[test]
fn test_adaptive_k_monotonic() {
    let mut previous = adaptive_k(0);
    for n in 1..1000 {
        let k = adaptive_k(n);
        assert!(k >= previous, "k decreased at n={n}: {previous} -> {k}");
        previous = k;
    }
}

#[test]
fn test_rrf_sorted_and_floored() {
    let candidates = vec![
        scored("a", 0.90, 0.0),
        scored("b", 0.30, 5.0),
        scored("c", 0.70, 3.0),
        scored("d", 0.50, 1.0),
        scored("e", 0.35, 4.0),
    ];

    let fused = fuse_with_rrf(candidates, None, 0.35);

    assert_eq!(fused.len(), 4);
    assert!(fused.iter().all(|c| c.semantic_score >= 0.35));
    assert!(!ids(&fused).contains(&"b"));
    for pair in fused.windows(2) {
        assert!(pair[0].rrf_score.unwrap() >= pair[1].rrf_score.unwrap());
    }
}

#[test]
fn test_rrf_score_formula() {
    let candidates = vec![scored("a", 0.9, 1.0), scored("b", 0.8, 2.0)];

    let fused = fuse_with_rrf(candidates, Some(60.0), 0.0);

    // a: semantic rank 1, bm25 rank 2; b: semantic rank 2, bm25 rank 1
    let expected = 1.0 / 61.0 + 1.0 / 62.0;
    for candidate in &fused {
        assert!((candidate.rrf_score.unwrap() - expected).abs() < 1e-6);
    }
}

#[test]
fn test_rrf_agreement_wins() {
    let candidates = vec![
        scored("both", 0.8, 4.0),
        scored("semantic_only", 0.9, 0.0),
        scored("lexical_only", 0.4, 5.0),
        scored("neither", 0.5, 1.0),
    ];

    let fused = fuse_with_rrf(candidates, None, 0.35);
    assert_eq!(fused[0].id, "both");
}

#[test]
fn test_rrf_ties_keep_input_order() {
    let candidates = vec![scored("first", 0.6, 0.0), scored("second", 0.6, 0.0)];
    let fused = fuse_with_rrf(candidates, None, 0.35);
    assert_eq!(ids(&fused), vec!["first", "second"]);
}

#[test]
fn test_rrf_empty_and_all_filtered() {
    assert!(fuse_with_rrf(Vec::new(), None, 0.35).is_empty());

    let candidates = vec![scored("a", 0.1, 3.0), scored("b", 0.2, 1.0)];
    assert!(fuse_with_rrf(candidates, None, 0.35).is_empty());
}

#[test]
fn test_weighted_fusion() {
    let candidates = vec![
        scored("a", 0.9, 0.0),
        scored("b", 0.5, 10.0),
        scored("c", 0.7, 5.0),
    ];

    let fused = fuse_with_weights(candidates, 0.7, 0.3);

    // a: 0.63 + 0.0, b: 0.35 + 0.3, c: 0.49 + 0.15
    assert_eq!(ids(&fused), vec!["b", "c", "a"]);
    assert!((fused[0].hybrid_score.unwrap() - 0.65).abs() < 1e-6);
    assert!((fused[2].hybrid_score.unwrap() - 0.63).abs() < 1e-6);
}

#[test]
fn test_weighted_applies_no_floor() {
    let candidates = vec![scored("low", 0.1, 0.0)];
    let fused = fuse_with_weights(candidates, 0.7, 0.3);
    assert_eq!(fused.len(), 1);
}

#[test]
fn test_weighted_degenerate_range() {
    let positive = fuse_with_weights(vec![scored("a", 0.5, 2.0), scored("b", 0.5, 2.0)], 0.0, 1.0);
    assert!(positive.iter().all(|c| c.hybrid_score == Some(1.0)));

    let zero = fuse_with_weights(vec![scored("a", 0.5, 0.0), scored("b", 0.5, 0.0)], 0.0, 1.0);
    assert!(zero.iter().all(|c| c.hybrid_score == Some(0.0)));
}

#[test]
fn test_weighted_empty() {
    assert!(fuse_with_weights(Vec::new(), 0.7, 0.3).is_empty());
}
