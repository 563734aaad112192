//! Fact store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mnemo_config::{ScoringConfig, StoreConfig};
use mnemo_coordinator::{CoordinatorStats, RequestCoordinator};
use mnemo_protocols::{
    CollectionRecord, EmbeddingBackend, FactFilters, RankedFact, RequestPriority,
    ScoredCandidate, StoreError, StoreOperation, UserFact, VectorCollection,
};
use mnemo_scoring::HybridScorer;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::filters::to_metadata_filter;
use crate::record;

/// Persists and retrieves user-scoped facts.
///
/// Embeddings are requested through the shared coordinator; candidates from
/// the collection are re-ranked by the hybrid scorer. Nothing is retried.
///
/// Writes to one user's partition are serialized, so the immutability check
/// and the upsert that follows it cannot interleave with another write.
pub struct FactStore<B: EmbeddingBackend + 'static> {
    coordinator: Arc<RequestCoordinator<B>>,
    collection: Arc<dyn VectorCollection>,
    scorer: HybridScorer,
    config: StoreConfig,
    partition_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<B: EmbeddingBackend + 'static> FactStore<B> {
    pub fn new(
        coordinator: Arc<RequestCoordinator<B>>,
        collection: Arc<dyn VectorCollection>,
        scoring: ScoringConfig,
        config: StoreConfig,
    ) -> Self {
        Self {
            coordinator,
            collection,
            scorer: HybridScorer::new(scoring),
            config,
            partition_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &Arc<RequestCoordinator<B>> {
        &self.coordinator
    }

    pub fn collection(&self) -> &Arc<dyn VectorCollection> {
        &self.collection
    }

    pub fn scorer(&self) -> &HybridScorer {
        &self.scorer
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    /// Store a new fact and return its id.
    ///
    /// An id is generated when absent. Overwriting an existing immutable
    /// fact with the same id is refused.
    pub async fn store_fact(&self, fact: UserFact) -> Result<String, StoreError> {
        validate(&fact)?;
        let partition = self.partition_lock(&fact.user_id);
        let _guard = partition.lock().await;
        self.write(fact, StoreOperation::Store).await
    }

    /// Replace a mutable fact in place, re-embedding its content.
    pub async fn update_fact(&self, mut fact: UserFact) -> Result<(), StoreError> {
        validate(&fact)?;
        let id = fact
            .id
            .clone()
            .ok_or_else(|| StoreError::Validation("fact id is required for update".to_string()))?;

        let partition = self.partition_lock(&fact.user_id);
        let _guard = partition.lock().await;
        let existing = self
            .fetch(&fact.user_id, &id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if existing.is_immutable {
            return Err(StoreError::ImmutableFact(id));
        }

        fact.created_at = existing.created_at;
        self.embed_and_upsert(fact, StoreOperation::Update).await?;
        info!("Updated fact {}", id);
        Ok(())
    }

    /// Store `new_fact` and retire the fact it replaces.
    ///
    /// The prior fact's `valid_until` becomes the new fact's `valid_from`, or
    /// now when unset. Works for immutable prior facts. If the prior fact
    /// cannot be retired, the new fact is rolled back before the error is
    /// returned.
    pub async fn supersede_fact(
        &self,
        user_id: &str,
        old_id: &str,
        new_fact: UserFact,
    ) -> Result<String, StoreError> {
        validate(&new_fact)?;
        if new_fact.user_id != user_id {
            return Err(StoreError::Validation(format!(
                "superseding fact belongs to user {}, expected {}",
                new_fact.user_id, user_id
            )));
        }
        if new_fact.id.as_deref() == Some(old_id) {
            return Err(StoreError::Validation(
                "a fact cannot supersede itself".to_string(),
            ));
        }

        let partition = self.partition_lock(user_id);
        let _guard = partition.lock().await;

        let mut old = self
            .fetch(user_id, old_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(old_id.to_string()))?;
        let displaced = match &new_fact.id {
            Some(id) => self.fetch(user_id, id).await?,
            None => None,
        };

        let retired_at = new_fact.valid_from.unwrap_or_else(Utc::now);
        let new_id = self.write(new_fact, StoreOperation::Supersede).await?;

        old.valid_until = Some(match old.valid_from {
            Some(from) if from > retired_at => from,
            _ => retired_at,
        });
        if let Err(e) = self.retire(user_id, old_id, &old).await {
            self.roll_back(user_id, &new_id, displaced).await;
            return Err(e);
        }

        info!("Fact {} superseded by {} for user {}", old_id, new_id, user_id);
        Ok(new_id)
    }

    /// Fetch a fact from the user's partition.
    pub async fn get_fact(&self, user_id: &str, id: &str) -> Result<Option<UserFact>, StoreError> {
        self.fetch(user_id, id).await
    }

    /// Delete a fact from the user's partition. Returns `false` if absent.
    pub async fn delete_fact(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let partition = self.partition_lock(user_id);
        let _guard = partition.lock().await;
        let deleted = self.collection.delete(user_id, id).await?;
        if deleted {
            info!("Deleted fact {} for user {}", id, user_id);
        }
        Ok(deleted)
    }

    /// Rank the user's facts against `query_text`.
    ///
    /// A candidate pool larger than `max_results` is pulled from the
    /// collection and re-ranked before truncation.
    pub async fn query(
        &self,
        query_text: &str,
        user_id: &str,
        filters: &FactFilters,
        max_results: usize,
    ) -> Result<Vec<RankedFact>, StoreError> {
        if user_id.trim().is_empty() {
            return Err(StoreError::Validation("user_id must not be empty".to_string()));
        }
        if max_results == 0 {
            return Err(StoreError::Validation("max_results must be at least 1".to_string()));
        }
        if query_text.trim().is_empty() {
            return Err(StoreError::Validation("query must not be empty".to_string()));
        }

        let embedding = self
            .coordinator
            .embed(query_text, RequestPriority::High)
            .await
            .map_err(|e| StoreError::coordinator(StoreOperation::Query, e))?;

        let filter = to_metadata_filter(filters, Utc::now());
        let pool = self.config.candidate_pool(max_results);
        let hits = self
            .collection
            .query(user_id, &embedding.vector, filter.as_ref(), pool)
            .await?;

        let mut facts = HashMap::with_capacity(hits.len());
        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            if record::owner(&hit.metadata) != Some(user_id) {
                warn!(
                    "Discarding record {} outside partition {}",
                    hit.id, user_id
                );
                continue;
            }
            let id = hit.id.clone();
            let candidate = ScoredCandidate::from(hit.clone());
            match record::from_hit(hit) {
                Ok(fact) => {
                    candidates.push(candidate);
                    facts.insert(id, fact);
                }
                Err(e) => warn!("Skipping unreadable record {} for user {}: {}", id, user_id, e),
            }
        }

        let candidate_count = candidates.len();
        let ranked: Vec<RankedFact> = self
            .scorer
            .rank(candidates, query_text)
            .into_iter()
            .filter_map(|candidate| {
                let fact = facts.remove(&candidate.id)?;
                Some(RankedFact {
                    semantic_score: candidate.semantic_score,
                    bm25_score: candidate.bm25_score,
                    score: candidate.score(),
                    fact,
                })
            })
            .take(max_results)
            .collect();

        debug!(
            "Query for user {} ranked {} of {} candidates",
            user_id,
            ranked.len(),
            candidate_count
        );
        Ok(ranked)
    }

    /// The write lock for `user_id`, created on first use.
    fn partition_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.partition_locks.lock();
        // Drop locks nobody holds or waits on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(user_id.to_string()).or_default().clone()
    }

    async fn fetch(&self, user_id: &str, id: &str) -> Result<Option<UserFact>, StoreError> {
        let Some(hit) = self.collection.get(user_id, id).await? else {
            return Ok(None);
        };
        if record::owner(&hit.metadata) != Some(user_id) {
            warn!("Discarding record {} outside partition {}", id, user_id);
            return Ok(None);
        }
        record::from_hit(hit).map(Some)
    }

    /// Assign an id, guard immutable records and persist.
    async fn write(&self, mut fact: UserFact, operation: StoreOperation) -> Result<String, StoreError> {
        let id = match &fact.id {
            Some(id) => id.clone(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                fact.id = Some(id.clone());
                id
            }
        };

        if let Some(existing) = self.fetch(&fact.user_id, &id).await? {
            if existing.is_immutable {
                return Err(StoreError::ImmutableFact(id));
            }
        }

        let user_id = fact.user_id.clone();
        self.embed_and_upsert(fact, operation).await?;
        info!("Stored fact {} for user {}", id, user_id);
        Ok(id)
    }

    /// Close the prior fact's validity window.
    async fn retire(&self, user_id: &str, old_id: &str, old: &UserFact) -> Result<(), StoreError> {
        let updated = self
            .collection
            .update_metadata(user_id, old_id, record::to_metadata(old))
            .await?;
        if !updated {
            return Err(StoreError::NotFound(old_id.to_string()));
        }
        Ok(())
    }

    /// Undo a superseding write: restore the record it replaced, or remove it.
    async fn roll_back(&self, user_id: &str, new_id: &str, displaced: Option<UserFact>) {
        let restored = match displaced {
            Some(fact) => self.embed_and_upsert(fact, StoreOperation::Supersede).await,
            None => self
                .collection
                .delete(user_id, new_id)
                .await
                .map(|_| ())
                .map_err(StoreError::from),
        };
        match restored {
            Ok(()) => debug!("Rolled back superseding fact {} for user {}", new_id, user_id),
            Err(e) => warn!(
                "Failed to roll back superseding fact {} for user {}: {}",
                new_id, user_id, e
            ),
        }
    }

    async fn embed_and_upsert(&self, fact: UserFact, operation: StoreOperation) -> Result<(), StoreError> {
        let embedding = self
            .coordinator
            .embed(fact.content.clone(), RequestPriority::Normal)
            .await
            .map_err(|e| StoreError::coordinator(operation, e))?;

        let record = CollectionRecord {
            id: fact.id.clone().unwrap_or_default(),
            vector: embedding.vector,
            metadata: record::to_metadata(&fact),
            document: fact.content,
        };
        self.collection.upsert(&fact.user_id, record).await?;
        Ok(())
    }
}

fn validate(fact: &UserFact) -> Result<(), StoreError> {
    if fact.content.trim().is_empty() {
        return Err(StoreError::Validation("content must not be empty".to_string()));
    }
    if fact.user_id.trim().is_empty() {
        return Err(StoreError::Validation("user_id must not be empty".to_string()));
    }
    if fact.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(StoreError::Validation("id must not be blank".to_string()));
    }
    if !fact.confidence.is_finite() || !(0.0..=1.0).contains(&fact.confidence) {
        return Err(StoreError::Validation(format!(
            "confidence must be within [0, 1], got {}",
            fact.confidence
        )));
    }
    if let (Some(from), Some(until)) = (fact.valid_from, fact.valid_until) {
        if until < from {
            return Err(StoreError::Validation(
                "valid_until must not precede valid_from".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
