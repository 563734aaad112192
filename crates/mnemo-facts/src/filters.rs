//! Translation of query filters into collection metadata filters.

use chrono::{DateTime, Utc};
use mnemo_protocols::{FactFilters, MetadataFilter};
use serde_json::json;

use crate::record;

/// Build the collection filter for `filters`, evaluated at `now`.
///
/// Returns `None` when nothing constrains the search. The user partition is
/// never part of this filter; collections apply it separately.
pub fn to_metadata_filter(filters: &FactFilters, now: DateTime<Utc>) -> Option<MetadataFilter> {
    let mut clauses = Vec::new();

    if !filters.fact_types.is_empty() {
        clauses.push(MetadataFilter::In(
            record::FACT_TYPE.to_string(),
            filters.fact_types.iter().map(|t| json!(t.as_str())).collect(),
        ));
    }

    if let Some(category) = &filters.category {
        clauses.push(MetadataFilter::Eq(record::CATEGORY.to_string(), json!(category)));
    }

    if !filters.entities.is_empty() {
        clauses.push(MetadataFilter::ContainsAny(
            record::ENTITIES.to_string(),
            filters.entities.clone(),
        ));
    }

    if let Some(min_confidence) = filters.min_confidence {
        clauses.push(MetadataFilter::Gte(
            record::CONFIDENCE.to_string(),
            f64::from(min_confidence),
        ));
    }

    if !filters.include_expired {
        clauses.push(MetadataFilter::Or(vec![
            MetadataFilter::IsNull(record::VALID_UNTIL.to_string()),
            MetadataFilter::Gt(record::VALID_UNTIL.to_string(), now.timestamp_millis() as f64),
        ]));
    }

    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(MetadataFilter::And(clauses)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mnemo_protocols::{FactType, UserFact};

    fn metadata(fact: &UserFact) -> mnemo_protocols::Metadata {
        record::to_metadata(fact)
    }

    #[test]
    fn test_default_filters_exclude_expired_only() {
        let now = Utc::now();
        let filter = to_metadata_filter(&FactFilters::default(), now).unwrap();

        let current = UserFact::new("u1", "current", FactType::Context);
        let expired = UserFact::new("u1", "expired", FactType::Context)
            .with_validity(None, Some(now - Duration::hours(1)));
        let ending_later = UserFact::new("u1", "later", FactType::Context)
            .with_validity(None, Some(now + Duration::hours(1)));

        assert!(filter.matches(&metadata(&current)));
        assert!(!filter.matches(&metadata(&expired)));
        assert!(filter.matches(&metadata(&ending_later)));
    }

    #[test]
    fn test_include_expired_without_other_filters_is_none() {
        let filters = FactFilters::new().include_expired();
        assert!(to_metadata_filter(&filters, Utc::now()).is_none());
    }

    #[test]
    fn test_single_clause_is_not_wrapped() {
        let filters = FactFilters::new().with_category("food").include_expired();
        let filter = to_metadata_filter(&filters, Utc::now()).unwrap();
        assert_eq!(
            filter,
            MetadataFilter::Eq(record::CATEGORY.to_string(), json!("food"))
        );
    }

    #[test]
    fn test_combined_filters() {
        let filters = FactFilters::new()
            .with_fact_types(vec![FactType::Preference, FactType::Relationship])
            .with_entities(vec!["alice".to_string()])
            .with_min_confidence(0.5);
        let filter = to_metadata_filter(&filters, Utc::now()).unwrap();

        let matching = UserFact::new("u1", "Likes Alice's cooking", FactType::Preference)
            .with_entities(vec!["Alice".to_string()])
            .with_confidence(0.8);
        let mut wrong_type = matching.clone();
        wrong_type.fact_type = FactType::Identity;
        let low_confidence = matching.clone().with_confidence(0.2);
        let other_entity = matching.clone().with_entities(vec!["Bob".to_string()]);

        assert!(filter.matches(&metadata(&matching)));
        assert!(!filter.matches(&metadata(&wrong_type)));
        assert!(!filter.matches(&metadata(&low_confidence)));
        assert!(!filter.matches(&metadata(&other_entity)));
    }
}
