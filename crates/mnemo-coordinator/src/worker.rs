//! Worker tasks executing flushed batches.

use std::sync::Arc;

use mnemo_protocols::{CoordinatorError, Embedding, EmbeddingBackend};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::coordinator::{Member, Shared};
use crate::request::{EmbeddingOutput, OperationKind};

/// A batch cleared for a backend call.
struct Job {
    kind: OperationKind,
    members: Vec<Member>,
    /// Carries the half-open trial slot.
    trial: bool,
}

/// A single worker of the pool.
pub(crate) struct Worker<B> {
    id: usize,
    shared: Arc<Shared<B>>,
}

impl<B: EmbeddingBackend + 'static> Worker<B> {
    pub fn new(id: usize, shared: Arc<Shared<B>>) -> Self {
        Self { id, shared }
    }

    /// Pull ready batches until the ready signal is closed.
    pub async fn run(self) {
        debug!("Worker {} started", self.id);
        loop {
            match self.shared.ready_signal.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => break,
            }
            if let Some(job) = self.take_job() {
                self.execute(job).await;
            }
        }
        debug!("Worker {} stopped", self.id);
    }

    /// Pop the next batch and decide whether it may reach the backend.
    fn take_job(&self) -> Option<Job> {
        let mut state = self.shared.state.lock();
        let batch = state.ready.pop()?;

        let trial = batch.members.iter().any(|member| member.trial);
        let total = batch.members.len();
        let live: Vec<Member> = batch
            .members
            .into_iter()
            .filter(|member| !member.reply.is_closed())
            .collect();

        if live.is_empty() {
            if trial {
                state.breaker.release_trial();
            }
            debug!(
                "Worker {} dropped {:?} batch: all {} callers gone",
                self.id, batch.kind, total
            );
            return None;
        }

        if !state.breaker.can_dispatch(trial) {
            drop(state);
            debug!(
                "Worker {} rejected {:?} batch of {}: circuit open",
                self.id,
                batch.kind,
                live.len()
            );
            for member in live {
                let _ = member.reply.send(Err(CoordinatorError::CircuitOpen));
            }
            return None;
        }

        Some(Job {
            kind: batch.kind,
            members: live,
            trial,
        })
    }

    async fn execute(&self, job: Job) {
        let individual = matches!(job.members.as_slice(), [member] if member.single);

        let result = {
            let texts: Vec<&str> = job
                .members
                .iter()
                .flat_map(|member| member.texts.iter().map(String::as_str))
                .collect();

            debug!(
                "Worker {} dispatching {:?} batch: {} members, {} texts",
                self.id,
                job.kind,
                job.members.len(),
                texts.len()
            );

            let result = match texts.as_slice() {
                [text] if individual => self.shared.backend.embed(text).await.map(|e| vec![e]),
                _ => self.shared.backend.embed_batch(&texts).await,
            };
            self.shared.stats.record_backend_call(individual);

            result
                .map_err(CoordinatorError::from)
                .and_then(|vectors| {
                    if vectors.len() == texts.len() {
                        Ok(vectors)
                    } else {
                        Err(CoordinatorError::Backend(format!(
                            "backend returned {} embeddings for {} texts",
                            vectors.len(),
                            texts.len()
                        )))
                    }
                })
        };

        {
            let mut state = self.shared.state.lock();
            match &result {
                Ok(_) => state.breaker.record_success(job.trial),
                Err(e) => {
                    warn!("Worker {} backend call failed: {}", self.id, e);
                    state.breaker.record_failure(Instant::now(), job.trial);
                }
            }
        }

        deliver(job.members, result);
    }
}

/// Hand every member its own contiguous slice, or the shared error.
fn deliver(members: Vec<Member>, result: Result<Vec<Embedding>, CoordinatorError>) {
    match result {
        Ok(vectors) => {
            let mut vectors = vectors.into_iter();
            for member in members {
                let output = if member.single {
                    vectors.next().map(EmbeddingOutput::Single).ok_or_else(|| {
                        CoordinatorError::Backend("missing embedding in batch response".to_string())
                    })
                } else {
                    Ok(EmbeddingOutput::Batch(
                        vectors.by_ref().take(member.texts.len()).collect(),
                    ))
                };
                let _ = member.reply.send(output);
            }
        }
        Err(e) => {
            for member in members {
                let _ = member.reply.send(Err(e.clone()));
            }
        }
    }
}
