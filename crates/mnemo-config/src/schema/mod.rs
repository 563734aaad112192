//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_coordinator;
mod schema_infra;
mod schema_scoring;

pub use schema_coordinator::*;
pub use schema_infra::*;
pub use schema_scoring::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
