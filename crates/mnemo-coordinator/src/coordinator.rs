//! Request coordinator.
//!
//! Every embedding request passes through [`RequestCoordinator::submit`]:
//!
//! 1. Admission under the state lock: shutdown flag, circuit breaker, token bucket.
//! 2. The admitted request joins an open micro-batch for its operation kind.
//! 3. Flushed batches wait in a priority ready queue.
//! 4. A fixed set of workers pulls batches and performs the backend call.
//!
//! The caller waits on a oneshot reply bounded by its own timeout. A caller
//! that gives up is skipped at dispatch; it never cancels a backend call that
//! other batch members depend on.

use std::sync::Arc;

use mnemo_config::CoordinatorConfig;
use mnemo_protocols::{CoordinatorError, Embedding, EmbeddingBackend, RequestPriority};
use parking_lot::Mutex;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::batcher::{Batch, MicroBatcher, PushOutcome};
use crate::circuit_breaker::{Admission, CircuitBreaker, CircuitState};
use crate::queue::ReadyQueue;
use crate::rate_limiter::TokenBucket;
use crate::request::{EmbeddingOutput, EmbeddingRequest, Operation, OperationKind};
use crate::stats::{CoordinatorStats, StatsRecorder};
use crate::worker::Worker;

pub(crate) type Reply = Result<EmbeddingOutput, CoordinatorError>;

/// One admitted request inside a batch.
pub(crate) struct Member {
    pub texts: Vec<String>,
    /// Submitted as `Operation::Embed`.
    pub single: bool,
    pub priority: RequestPriority,
    /// Holds the half-open trial slot.
    pub trial: bool,
    pub reply: oneshot::Sender<Reply>,
}

/// Mutable state shared by callers, timers and workers.
pub(crate) struct State {
    pub breaker: CircuitBreaker,
    pub limiter: TokenBucket,
    pub batcher: MicroBatcher<Member>,
    pub ready: ReadyQueue<Batch<Member>>,
    pub shutdown: bool,
}

impl State {
    fn queue_depth(&self) -> usize {
        self.batcher.pending()
            + self
                .ready
                .iter()
                .map(|batch| batch.members.len())
                .sum::<usize>()
    }
}

pub(crate) struct Shared<B> {
    pub backend: B,
    pub config: CoordinatorConfig,
    pub state: Mutex<State>,
    /// One permit per batch in the ready queue. Closed on shutdown.
    pub ready_signal: Semaphore,
    pub stats: StatsRecorder,
}

enum Admitted {
    Immediate(EmbeddingOutput),
    Queued(oneshot::Receiver<Reply>),
}

impl<B: EmbeddingBackend + 'static> Shared<B> {
    fn admit(self: &Arc<Self>, request: EmbeddingRequest) -> Result<Admitted, CoordinatorError> {
        let kind = request.operation.kind();
        let (tx, rx) = oneshot::channel();

        let flush_generation = {
            let mut state = self.state.lock();

            if state.shutdown {
                return Err(CoordinatorError::Shutdown);
            }

            if let Operation::EmbedBatch(texts) = &request.operation {
                if texts.is_empty() {
                    return Ok(Admitted::Immediate(EmbeddingOutput::Batch(Vec::new())));
                }
            }

            let now = Instant::now();
            let admission = state.breaker.admit(now);
            if admission == Admission::Rejected {
                debug!("Request rejected: circuit {:?}", state.breaker.state());
                return Err(CoordinatorError::CircuitOpen);
            }

            if !state.limiter.try_acquire_at(now) {
                if admission == Admission::Trial {
                    state.breaker.release_trial();
                }
                debug!("Request rejected: rate limit exceeded");
                return Err(CoordinatorError::RateLimitExceeded);
            }

            let member = Member {
                single: kind == OperationKind::Embed,
                texts: request.operation.into_texts(),
                priority: request.priority,
                trial: admission == Admission::Trial,
                reply: tx,
            };

            match state.batcher.push(kind, member) {
                PushOutcome::Full(batch) => {
                    self.enqueue(&mut state, batch);
                    None
                }
                PushOutcome::Opened { generation } => Some(generation),
                PushOutcome::Joined => None,
            }
        };

        if let Some(generation) = flush_generation {
            self.arm_flush_timer(kind, generation);
        }

        Ok(Admitted::Queued(rx))
    }

    fn enqueue(&self, state: &mut State, batch: Batch<Member>) {
        let priority = batch
            .members
            .iter()
            .map(|member| member.priority)
            .max()
            .unwrap_or_default();
        debug!(
            "Batch ready: {:?} with {} members (priority: {:?})",
            batch.kind,
            batch.members.len(),
            priority
        );
        state.ready.push(priority, batch);
        self.ready_signal.add_permits(1);
    }

    fn arm_flush_timer(self: &Arc<Self>, kind: OperationKind, generation: u64) {
        let shared = Arc::clone(self);
        let delay = self.config.batch_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.state.lock();
            if let Some(batch) = state.batcher.take_expired(kind, generation) {
                shared.enqueue(&mut state, batch);
            }
        });
    }

    /// Set the shutdown flag and cancel everything not yet dispatched.
    ///
    /// Returns `false` if shutdown had already begun.
    fn begin_shutdown(&self) -> bool {
        let cancelled: Vec<Member> = {
            let mut state = self.state.lock();
            if state.shutdown {
                return false;
            }
            state.shutdown = true;

            let mut members = Vec::new();
            for batch in state.batcher.drain() {
                members.extend(batch.members);
            }
            for batch in state.ready.drain() {
                members.extend(batch.members);
            }
            members
        };

        self.ready_signal.close();
        info!(
            "Request coordinator shutting down, cancelling {} queued requests",
            cancelled.len()
        );
        for member in cancelled {
            let _ = member.reply.send(Err(CoordinatorError::Shutdown));
        }
        true
    }
}

/// Throttled, batched, circuit-protected access to one embedding backend.
///
/// Must be created inside a Tokio runtime: the worker pool is spawned on
/// construction. Dropping the coordinator initiates shutdown.
pub struct RequestCoordinator<B: EmbeddingBackend + 'static> {
    shared: Arc<Shared<B>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: EmbeddingBackend + 'static> RequestCoordinator<B> {
    /// Create a coordinator and start `max_concurrent` workers.
    pub fn new(backend: B, config: CoordinatorConfig) -> Self {
        let state = State {
            breaker: CircuitBreaker::new(
                config.circuit_failure_threshold,
                config.circuit_timeout(),
            ),
            limiter: TokenBucket::new(config.rate_limit_per_second),
            batcher: MicroBatcher::new(config.batch_size, config.batch_timeout()),
            ready: ReadyQueue::new(),
            shutdown: false,
        };

        let worker_count = config.max_concurrent.max(1);
        let shared = Arc::new(Shared {
            backend,
            config,
            state: Mutex::new(state),
            ready_signal: Semaphore::new(0),
            stats: StatsRecorder::default(),
        });

        let workers = (0..worker_count)
            .map(|id| tokio::spawn(Worker::new(id, Arc::clone(&shared)).run()))
            .collect();

        info!("Request coordinator started with {} workers", worker_count);

        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    /// Submit a request and wait for its result.
    pub async fn submit(&self, request: EmbeddingRequest) -> Result<EmbeddingOutput, CoordinatorError> {
        let started = Instant::now();
        let result = self.process(request).await;
        self.shared.stats.record_outcome(&result, started.elapsed());
        result
    }

    async fn process(&self, request: EmbeddingRequest) -> Result<EmbeddingOutput, CoordinatorError> {
        let timeout = request
            .timeout
            .unwrap_or_else(|| self.shared.config.default_timeout());

        let rx = match self.shared.admit(request)? {
            Admitted::Immediate(output) => return Ok(output),
            Admitted::Queued(rx) => rx,
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            // Sender dropped without a reply: the coordinator went away.
            Ok(Err(_)) => Err(CoordinatorError::Shutdown),
            Err(_) => {
                debug!("Request timed out after {:?}", timeout);
                Err(CoordinatorError::Timeout(timeout))
            }
        }
    }

    /// Embed a single text.
    pub async fn embed(
        &self,
        text: impl Into<String>,
        priority: RequestPriority,
    ) -> Result<Embedding, CoordinatorError> {
        self.submit(EmbeddingRequest::embed(text).with_priority(priority))
            .await?
            .into_single()
    }

    /// Embed several texts, preserving order.
    pub async fn embed_batch(
        &self,
        texts: Vec<String>,
        priority: RequestPriority,
    ) -> Result<Vec<Embedding>, CoordinatorError> {
        let output = self
            .submit(EmbeddingRequest::embed_batch(texts).with_priority(priority))
            .await?;
        Ok(output.into_batch())
    }

    pub fn stats(&self) -> CoordinatorStats {
        let (circuit_state, shutting_down, queue_depth) = {
            let state = self.shared.state.lock();
            (state.breaker.state(), state.shutdown, state.queue_depth())
        };
        let backend_available = circuit_state != CircuitState::Open && !shutting_down;
        self.shared
            .stats
            .snapshot(circuit_state, backend_available, queue_depth)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    /// Reject new work, cancel queued work and wait for in-flight calls to finish.
    pub async fn shutdown(&self) {
        self.shared.begin_shutdown();

        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Coordinator worker failed: {}", e);
            }
        }
        info!("Request coordinator stopped");
    }
}

impl<B: EmbeddingBackend + 'static> Drop for RequestCoordinator<B> {
    fn drop(&mut self) {
        self.shared.begin_shutdown();
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
