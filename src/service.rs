//! Service wiring from configuration.

use std::path::Path;
use std::sync::Arc;

use mnemo_collection_memory::MemoryCollection;
use mnemo_collection_sqlite::SqliteCollection;
use mnemo_config::{
    CollectionBackendKind, CollectionConfig, Config, ConfigError, ConfigLoader, ConfigValidator,
    EmbeddingConfig, EmbeddingProviderKind,
};
use mnemo_coordinator::{CoordinatorStats, RequestCoordinator};
use mnemo_embedding::{HashingEmbedding, OpenAIEmbedding, OpenAIEmbeddingConfig};
use mnemo_facts::FactStore;
use mnemo_protocols::{
    CollectionError, EmbeddingBackend, FactFilters, RankedFact, StoreError, UserFact,
    VectorCollection,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the configured embedding backend.
pub fn build_backend(config: &EmbeddingConfig) -> Arc<dyn EmbeddingBackend> {
    match config.provider {
        EmbeddingProviderKind::OpenAi => {
            let openai = OpenAIEmbeddingConfig::new(config.api_key.clone().unwrap_or_default())
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_dimension(config.dimension);
            Arc::new(OpenAIEmbedding::new(openai))
        }
        EmbeddingProviderKind::Hashing => Arc::new(HashingEmbedding::new(config.dimension)),
    }
}

/// Open the configured vector collection, enforcing `dimension`.
pub async fn build_collection(
    config: &CollectionConfig,
    dimension: usize,
) -> Result<Arc<dyn VectorCollection>, CollectionError> {
    Ok(match config.backend {
        CollectionBackendKind::Memory => Arc::new(MemoryCollection::with_dimension(dimension)),
        CollectionBackendKind::Sqlite => {
            Arc::new(SqliteCollection::open(&config.path).await?.with_dimension(dimension))
        }
    })
}

/// Caller-facing entry point: a fact store with its coordinator.
pub struct MemoryService {
    store: FactStore<Arc<dyn EmbeddingBackend>>,
}

impl MemoryService {
    pub fn new(store: FactStore<Arc<dyn EmbeddingBackend>>) -> Self {
        Self { store }
    }

    /// Load a TOML file and wire the service from it.
    pub async fn load(path: &Path) -> Result<Self, ServiceError> {
        let config = ConfigLoader::load(path)?;
        Self::from_config(config).await
    }

    /// Validate `config` and wire the service. Must run inside a Tokio runtime.
    pub async fn from_config(config: Config) -> Result<Self, ServiceError> {
        let warnings = ConfigValidator::validate(&config).into_result()?;
        for warning in &warnings {
            warn!("Config warning at {}: {}", warning.path, warning.message);
        }

        let backend = build_backend(&config.embedding);
        let collection = build_collection(&config.collection, backend.dimension()).await?;
        let coordinator = Arc::new(RequestCoordinator::new(backend, config.coordinator));
        let store = FactStore::new(coordinator, collection, config.scoring, config.store);

        info!(
            "Memory service ready ({:?} embeddings, {:?} collection)",
            config.embedding.provider, config.collection.backend
        );
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &FactStore<Arc<dyn EmbeddingBackend>> {
        &self.store
    }

    pub async fn store_fact(&self, fact: UserFact) -> Result<String, StoreError> {
        self.store.store_fact(fact).await
    }

    pub async fn query(
        &self,
        query_text: &str,
        user_id: &str,
        filters: &FactFilters,
        max_results: usize,
    ) -> Result<Vec<RankedFact>, StoreError> {
        self.store.query(query_text, user_id, filters, max_results).await
    }

    pub fn get_stats(&self) -> CoordinatorStats {
        self.store.stats()
    }

    /// Stop accepting embedding requests and wait for in-flight calls.
    pub async fn shutdown(&self) {
        self.store.coordinator().shutdown().await;
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
