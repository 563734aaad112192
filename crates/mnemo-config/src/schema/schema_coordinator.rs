//! Request coordinator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Number of workers performing backend calls concurrently.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Token bucket refill rate; also the burst capacity.
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: f64,

    /// Consecutive backend failures that open the circuit.
    #[serde(default = "default_circuit_failure_threshold")]
    pub circuit_failure_threshold: u32,

    /// How long the circuit stays open before a trial request is allowed.
    #[serde(default = "default_circuit_timeout_ms")]
    pub circuit_timeout_ms: u64,

    /// Maximum number of requests coalesced into one backend call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long a batch stays open after its first member arrives.
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,

    /// Timeout applied to requests submitted without one.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_rate_limit_per_second() -> f64 {
    50.0
}

fn default_circuit_failure_threshold() -> u32 {
    5
}

fn default_circuit_timeout_ms() -> u64 {
    30_000
}

fn default_batch_size() -> usize {
    16
}

fn default_batch_timeout_ms() -> u64 {
    10
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl CoordinatorConfig {
    pub fn circuit_timeout(&self) -> Duration {
        Duration::from_millis(self.circuit_timeout_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            rate_limit_per_second: default_rate_limit_per_second(),
            circuit_failure_threshold: default_circuit_failure_threshold(),
            circuit_timeout_ms: default_circuit_timeout_ms(),
            batch_size: default_batch_size(),
            batch_timeout_ms: default_batch_timeout_ms(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}
