use super::*;

fn candidate(id: &str, content: &str, distance: f32) -> ScoredCandidate {
    ScoredCandidate::new(id, content, distance)
}

fn corpus() -> Vec<ScoredCandidate> {
    vec![
        candidate("0", "rust programming systems language fast", 0.4),
        candidate("1", "python programming scripting easy", 0.6),
        candidate("2", "java enterprise programming verbose", 0.8),
        candidate("3", "rust memory safety zero cost abstractions", 0.5),
    ]
}

#[test]
fn test_semantic_score_mapping() {
    assert_eq!(semantic_score(0.0), 1.0);
    assert_eq!(semantic_score(1.0), 0.5);
    assert_eq!(semantic_score(2.0), 0.0);
    assert_eq!(semantic_score(-0.5), 1.0);
    assert_eq!(semantic_score(3.0), 0.0);
}

#[test]
fn test_empty_candidates() {
    let scored = calculate_scores(Vec::new(), "rust", &Bm25Config::default());
    assert!(scored.is_empty());
}

#[test]
fn test_zero_query_terms_scores_exactly_zero() {
    let scored = calculate_scores(corpus(), "rust", &Bm25Config::default());
    assert_eq!(scored[1].bm25_score, 0.0);
    assert_eq!(scored[2].bm25_score, 0.0);
    assert!(scored[0].bm25_score > 0.0);
    assert!(scored[3].bm25_score > 0.0);
}

#[test]
fn test_semantic_scores_filled() {
    let scored = calculate_scores(corpus(), "rust", &Bm25Config::default());
    assert!((scored[0].semantic_score - 0.8).abs() < 1e-6);
    assert!((scored[2].semantic_score - 0.6).abs() < 1e-6);
}

#[test]
fn test_higher_term_frequency_ranks_higher() {
    let candidates = vec![
        candidate("a", "rust rust rust", 0.5),
        candidate("b", "rust programming", 0.5),
        candidate("c", "python", 0.5),
    ];
    let scored = calculate_scores(candidates, "rust", &Bm25Config::default());
    assert!(scored[0].bm25_score > scored[1].bm25_score);
}

#[test]
fn test_shorter_document_wins_at_equal_tf() {
    let candidates = vec![
        candidate("long", "rust is a language with many many extra words here", 0.5),
        candidate("short", "rust language", 0.5),
        candidate("other", "python", 0.5),
    ];
    let scored = calculate_scores(candidates, "rust", &Bm25Config::default());
    assert!(scored[1].bm25_score > scored[0].bm25_score);
}

#[test]
fn test_ubiquitous_terms_are_dropped() {
    // "programming" appears in every document: idf = ln(1 + 0.5/5.5) < 0.1 at N=5
    let candidates = vec![
        candidate("a", "rust programming", 0.5),
        candidate("b", "python programming", 0.5),
        candidate("c", "java programming", 0.5),
        candidate("d", "go programming", 0.5),
        candidate("e", "zig programming", 0.5),
    ];
    let scored = calculate_scores(candidates, "programming", &Bm25Config::default());
    assert!(scored.iter().all(|c| c.bm25_score == 0.0));
}

#[test]
fn test_duplicate_query_terms_count_once() {
    let once = calculate_scores(corpus(), "rust", &Bm25Config::default());
    let twice = calculate_scores(corpus(), "rust RUST rust", &Bm25Config::default());
    for (a, b) in once.iter().zip(&twice) {
        assert_eq!(a.bm25_score, b.bm25_score);
    }
}

#[test]
fn test_empty_documents_do_not_divide_by_zero() {
    let candidates = vec![candidate("a", "", 0.2), candidate("b", "!!", 0.3)];
    let scored = calculate_scores(candidates, "anything", &Bm25Config::default());
    assert!(scored.iter().all(|c| c.bm25_score == 0.0));
    assert!(scored.iter().all(|c| c.bm25_score.is_finite()));
}

#[test]
fn test_empty_query() {
    let scored = calculate_scores(corpus(), "", &Bm25Config::default());
    assert!(scored.iter().all(|c| c.bm25_score == 0.0));
}

#[test]
fn test_idempotent() {
    let params = Bm25Config::default();
    let once = calculate_scores(corpus(), "rust programming", &params);
    let twice = calculate_scores(once.clone(), "rust programming", &params);
    assert_eq!(once, twice);
}

#[test]
fn test_single_candidate_corpus() {
    let candidates = vec![candidate("sf", "User lives in San Francisco", 0.3)];
    let scored = calculate_scores(candidates, "where does the user live", &Bm25Config::default());
    // idf at N = 1, df = 1 is ln(4/3), above the floor
    assert!(scored[0].bm25_score > 0.0);
}

#[test]
fn test_order_preserved() {
    let scored = calculate_scores(corpus(), "rust", &Bm25Config::default());
    let ids: Vec<_> = scored.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3"]);
}
