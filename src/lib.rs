//! # Mnemo
//!
//! Retrieval core for personal memory: embeddings requested through a
//! rate-limited, batching, circuit-broken coordinator; candidates re-ranked by
//! BM25 fused with vector similarity; facts stored per user.
//!
//! [`MemoryService::from_config`] wires everything from a [`Config`].

pub mod logging;
mod service;

pub use service::{build_backend, build_collection, MemoryService, ServiceError};

pub use mnemo_config::{Config, ConfigLoader, ConfigValidator};
pub use mnemo_coordinator::{CoordinatorStats, RequestCoordinator};
pub use mnemo_facts::FactStore;
pub use mnemo_protocols::{
    EmbeddingBackend, FactFilters, FactType, RankedFact, RequestPriority, StoreError, UserFact,
    VectorCollection,
};
pub use mnemo_scoring::HybridScorer;
