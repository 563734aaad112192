//! # Mnemo Coordinator
//!
//! The single choke point between concurrent callers and the embedding backend.
//!
//! ## Features
//!
//! - Token bucket admission control
//! - Circuit breaker with half-open trial requests
//! - Micro-batching of same-kind requests
//! - Bounded worker pool with a priority ready queue
//! - Per-request timeouts and clean shutdown

pub mod batcher;
pub mod circuit_breaker;
pub mod coordinator;
pub mod queue;
pub mod rate_limiter;
pub mod request;
pub mod stats;
mod worker;

pub use batcher::{Batch, MicroBatcher, PushOutcome};
pub use circuit_breaker::{Admission, CircuitBreaker, CircuitState};
pub use coordinator::RequestCoordinator;
pub use queue::ReadyQueue;
pub use rate_limiter::TokenBucket;
pub use request::{EmbeddingOutput, EmbeddingRequest, Operation, OperationKind};
pub use stats::CoordinatorStats;
