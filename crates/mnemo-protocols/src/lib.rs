//! # Mnemo Protocols
//!
//! Shared definitions for the Mnemo memory core.
//! Contains types, traits and errors only - no implementations.
//!
//! ## Core Traits
//!
//! - [`EmbeddingBackend`] - Trait for embedding generation backends
//! - [`VectorCollection`] - Trait for vector collection storage
//!
//! ## Core Types
//!
//! - [`UserFact`] - A single stored statement about a user
//! - [`ScoredCandidate`] - A per-query ranking candidate
//! - [`RankedFact`] - A fact returned from a query with its scores

pub mod candidate;
pub mod collection;
pub mod embedding;
pub mod error;
pub mod fact;
pub mod types;

pub use candidate::ScoredCandidate;
pub use collection::{CollectionHit, CollectionRecord, MetadataFilter, VectorCollection};
pub use embedding::{Embedding, EmbeddingBackend};
pub use error::{CollectionError, CoordinatorError, EmbeddingError, StoreError, StoreOperation};
pub use fact::{FactFilters, FactType, RankedFact, UserFact};
pub use types::*;
