//! In-memory vector collection.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use mnemo_protocols::embedding::cosine_distance;
use mnemo_protocols::{
    CollectionError, CollectionHit, CollectionRecord, Metadata, MetadataFilter, VectorCollection,
};
use parking_lot::RwLock;
use tracing::debug;

type Partition = HashMap<String, CollectionRecord>;

/// Brute-force vector collection partitioned by user.
pub struct MemoryCollection {
    partitions: RwLock<HashMap<String, Partition>>,
    dimension: Option<usize>,
}

impl MemoryCollection {
    /// Create a collection accepting vectors of any dimension.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            dimension: None,
        }
    }

    /// Create a collection that rejects vectors of any other dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            dimension: Some(dimension),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), CollectionError> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(CollectionError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Total number of records across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn hit(record: &CollectionRecord, distance: f32) -> CollectionHit {
    CollectionHit {
        id: record.id.clone(),
        document: record.document.clone(),
        metadata: record.metadata.clone(),
        distance,
    }
}

#[async_trait]
impl VectorCollection for MemoryCollection {
    async fn upsert(&self, user_id: &str, record: CollectionRecord) -> Result<(), CollectionError> {
        self.check_dimension(&record.vector)?;
        debug!("Upserting record {} for user {}", record.id, user_id);
        self.partitions
            .write()
            .entry(user_id.to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn query(
        &self,
        user_id: &str,
        query_vector: &[f32],
        filter: Option<&MetadataFilter>,
        k: usize,
    ) -> Result<Vec<CollectionHit>, CollectionError> {
        self.check_dimension(query_vector)?;

        let partitions = self.partitions.read();
        let Some(partition) = partitions.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<CollectionHit> = partition
            .values()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| hit(record, cosine_distance(query_vector, &record.vector)))
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<CollectionHit>, CollectionError> {
        Ok(self
            .partitions
            .read()
            .get(user_id)
            .and_then(|partition| partition.get(id))
            .map(|record| hit(record, 0.0)))
    }

    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: Metadata,
    ) -> Result<bool, CollectionError> {
        let mut partitions = self.partitions.write();
        match partitions.get_mut(user_id).and_then(|p| p.get_mut(id)) {
            Some(record) => {
                record.metadata = metadata;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, CollectionError> {
        let mut partitions = self.partitions.write();
        Ok(partitions
            .get_mut(user_id)
            .and_then(|p| p.remove(id))
            .is_some())
    }

    async fn count(&self, user_id: &str) -> Result<usize, CollectionError> {
        Ok(self.partitions.read().get(user_id).map_or(0, HashMap::len))
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
