//! Vector collection protocol definitions.
//!
//! A vector collection owns embeddings and performs nearest-neighbour search.
//! Every operation is scoped by a `user_id` partition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollectionError;
use crate::types::Metadata;

/// Core trait for vector collections.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Insert or replace a record in the user's partition.
    async fn upsert(&self, user_id: &str, record: CollectionRecord) -> Result<(), CollectionError>;

    /// Nearest-neighbour search within the user's partition.
    ///
    /// Returns at most `k` hits sorted by ascending distance.
    async fn query(
        &self,
        user_id: &str,
        query_vector: &[f32],
        filter: Option<&MetadataFilter>,
        k: usize,
    ) -> Result<Vec<CollectionHit>, CollectionError>;

    /// Fetch a single record (without its vector).
    async fn get(&self, user_id: &str, id: &str) -> Result<Option<CollectionHit>, CollectionError>;

    /// Replace the metadata of an existing record, keeping its vector and document.
    ///
    /// Returns `false` if the record does not exist.
    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: Metadata,
    ) -> Result<bool, CollectionError>;

    /// Delete a record. Returns `false` if it did not exist.
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, CollectionError>;

    /// Number of records in the user's partition.
    async fn count(&self, user_id: &str) -> Result<usize, CollectionError>;
}

/// A record written to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub document: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A record returned from a collection.
///
/// `distance` is the cosine distance to the query vector (0.0 for `get`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionHit {
    pub id: String,
    pub document: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub distance: f32,
}

/// Filter over record metadata, evaluated by collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFilter {
    /// Field equals the value.
    Eq(String, Value),
    /// Field equals any of the values.
    In(String, Vec<Value>),
    /// Numeric field is greater than or equal to the bound.
    Gte(String, f64),
    /// Numeric field is strictly greater than the bound.
    Gt(String, f64),
    /// Array field contains any of the strings.
    ContainsAny(String, Vec<String>),
    /// Field is absent or null.
    IsNull(String),
    And(Vec<MetadataFilter>),
    Or(Vec<MetadataFilter>),
}

impl MetadataFilter {
    /// Evaluate the filter against a metadata map.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Eq(key, value) => metadata.get(key) == Some(value),
            Self::In(key, values) => metadata
                .get(key)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Self::Gte(key, bound) => number(metadata, key).is_some_and(|n| n >= *bound),
            Self::Gt(key, bound) => number(metadata, key).is_some_and(|n| n > *bound),
            Self::ContainsAny(key, needles) => match metadata.get(key) {
                Some(Value::Array(items)) => items.iter().any(|item| {
                    item.as_str()
                        .is_some_and(|s| needles.iter().any(|n| n.eq_ignore_ascii_case(s)))
                }),
                _ => false,
            },
            Self::IsNull(key) => metadata.get(key).is_none_or(Value::is_null),
            Self::And(filters) => filters.iter().all(|f| f.matches(metadata)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(metadata)),
        }
    }
}

fn number(metadata: &Metadata, key: &str) -> Option<f64> {
    metadata.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
