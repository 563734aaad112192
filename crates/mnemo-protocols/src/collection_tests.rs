use super::*;
use serde_json::json;

fn sample_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("fact_type".to_string(), json!("identity"));
    metadata.insert("confidence".to_string(), json!(0.8));
    metadata.insert("entities".to_string(), json!(["San Francisco", "Alice"]));
    metadata.insert("valid_until".to_string(), Value::Null);
    metadata
}

#[test]
fn test_eq_filter() {
    let metadata = sample_metadata();
    assert!(MetadataFilter::Eq("fact_type".to_string(), json!("identity")).matches(&metadata));
    assert!(!MetadataFilter::Eq("fact_type".to_string(), json!("context")).matches(&metadata));
    assert!(!MetadataFilter::Eq("missing".to_string(), json!("x")).matches(&metadata));
}

#[test]
fn test_in_filter() {
    let metadata = sample_metadata();
    let filter = MetadataFilter::In(
        "fact_type".to_string(),
        vec![json!("preference"), json!("identity")],
    );
    assert!(filter.matches(&metadata));
}

#[test]
fn test_numeric_filters() {
    let metadata = sample_metadata();
    assert!(MetadataFilter::Gte("confidence".to_string(), 0.8).matches(&metadata));
    assert!(!MetadataFilter::Gt("confidence".to_string(), 0.8).matches(&metadata));
    assert!(!MetadataFilter::Gte("fact_type".to_string(), 0.0).matches(&metadata));
}

#[test]
fn test_contains_any_is_case_insensitive() {
    let metadata = sample_metadata();
    let filter = MetadataFilter::ContainsAny("entities".to_string(), vec!["alice".to_string()]);
    assert!(filter.matches(&metadata));

    let filter = MetadataFilter::ContainsAny("entities".to_string(), vec!["Bob".to_string()]);
    assert!(!filter.matches(&metadata));
}

#[test]
fn test_is_null_matches_missing_and_null() {
    let metadata = sample_metadata();
    assert!(MetadataFilter::IsNull("valid_until".to_string()).matches(&metadata));
    assert!(MetadataFilter::IsNull("absent".to_string()).matches(&metadata));
    assert!(!MetadataFilter::IsNull("confidence".to_string()).matches(&metadata));
}

#[test]
fn test_and_or_composition() {
    let metadata = sample_metadata();
    let filter = MetadataFilter::And(vec![
        MetadataFilter::Eq("fact_type".to_string(), json!("identity")),
        MetadataFilter::Or(vec![
            MetadataFilter::IsNull("valid_until".to_string()),
            MetadataFilter::Gt("valid_until".to_string(), 0.0),
        ]),
    ]);
    assert!(filter.matches(&metadata));

    assert!(MetadataFilter::And(vec![]).matches(&metadata));
    assert!(!MetadataFilter::Or(vec![]).matches(&metadata));
}

#[test]
fn test_filter_serialization() {
    let filter = MetadataFilter::Gte("confidence".to_string(), 0.5);
    let json = serde_json::to_string(&filter).unwrap();
    let parsed: MetadataFilter = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, filter);
}
