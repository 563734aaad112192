//! Micro-batching of same-kind requests.
//!
//! The batcher only tracks open batches. Flushing on expiry is driven by the
//! coordinator, which arms a timer for every newly opened batch and hands its
//! generation back through [`MicroBatcher::take_expired`].

use std::collections::HashMap;
use std::time::Duration;

use crate::request::OperationKind;

/// A closed batch ready for dispatch.
#[derive(Debug)]
pub struct Batch<M> {
    pub kind: OperationKind,
    pub members: Vec<M>,
}

/// What happened to a pushed member.
#[derive(Debug)]
pub enum PushOutcome<M> {
    /// The member completed a batch, which must be dispatched now.
    Full(Batch<M>),
    /// The member opened a new batch; flush it after the batch timeout.
    Opened { generation: u64 },
    /// The member joined an open batch.
    Joined,
}

struct OpenBatch<M> {
    generation: u64,
    members: Vec<M>,
}

/// Groups members per operation kind, up to `batch_size` each.
pub struct MicroBatcher<M> {
    batch_size: usize,
    batch_timeout: Duration,
    open: HashMap<OperationKind, OpenBatch<M>>,
    next_generation: u64,
}

impl<M> MicroBatcher<M> {
    pub fn new(batch_size: usize, batch_timeout: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_timeout,
            open: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    /// Whether every member is flushed on arrival.
    fn flushes_immediately(&self) -> bool {
        self.batch_size == 1 || self.batch_timeout.is_zero()
    }

    pub fn push(&mut self, kind: OperationKind, member: M) -> PushOutcome<M> {
        if self.flushes_immediately() {
            return PushOutcome::Full(Batch {
                kind,
                members: vec![member],
            });
        }

        if let Some(open) = self.open.get_mut(&kind) {
            open.members.push(member);
            if open.members.len() >= self.batch_size {
                return match self.open.remove(&kind) {
                    Some(open) => PushOutcome::Full(Batch {
                        kind,
                        members: open.members,
                    }),
                    None => PushOutcome::Joined,
                };
            }
            return PushOutcome::Joined;
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.open.insert(
            kind,
            OpenBatch {
                generation,
                members: vec![member],
            },
        );
        PushOutcome::Opened { generation }
    }

    /// Close the batch opened as `generation`, unless it was already flushed.
    pub fn take_expired(&mut self, kind: OperationKind, generation: u64) -> Option<Batch<M>> {
        match self.open.get(&kind) {
            Some(open) if open.generation == generation => self.open.remove(&kind).map(|open| Batch {
                kind,
                members: open.members,
            }),
            _ => None,
        }
    }

    /// Close every open batch.
    pub fn drain(&mut self) -> Vec<Batch<M>> {
        self.open
            .drain()
            .map(|(kind, open)| Batch {
                kind,
                members: open.members,
            })
            .collect()
    }

    /// Members waiting in open batches.
    pub fn pending(&self) -> usize {
        self.open.values().map(|open| open.members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(10);

    #[test]
    fn test_fills_to_batch_size() {
        let mut batcher = MicroBatcher::new(3, WINDOW);

        assert!(matches!(
            batcher.push(OperationKind::Embed, 1),
            PushOutcome::Opened { .. }
        ));
        assert!(matches!(batcher.push(OperationKind::Embed, 2), PushOutcome::Joined));
        assert_eq!(batcher.pending(), 2);

        match batcher.push(OperationKind::Embed, 3) {
            PushOutcome::Full(batch) => {
                assert_eq!(batch.kind, OperationKind::Embed);
                assert_eq!(batch.members, vec![1, 2, 3]);
            }
            other => panic!("expected a full batch, got {:?}", other),
        }
        assert_eq!(batcher.pending(), 0);
    }

    #[test]
    fn test_kinds_are_batched_separately() {
        let mut batcher = MicroBatcher::new(2, WINDOW);
        batcher.push(OperationKind::Embed, "a");
        assert!(matches!(
            batcher.push(OperationKind::EmbedBatch, "b"),
            PushOutcome::Opened { .. }
        ));
        assert_eq!(batcher.pending(), 2);
    }

    #[test]
    fn test_take_expired_matches_generation() {
        let mut batcher = MicroBatcher::new(2, WINDOW);
        let PushOutcome::Opened { generation } = batcher.push(OperationKind::Embed, 1) else {
            panic!("expected a new batch");
        };
        // Filled and flushed before the timer fired
        batcher.push(OperationKind::Embed, 2);
        let PushOutcome::Opened { generation: next } = batcher.push(OperationKind::Embed, 3) else {
            panic!("expected a new batch");
        };

        assert!(batcher.take_expired(OperationKind::Embed, generation).is_none());
        let batch = batcher.take_expired(OperationKind::Embed, next).unwrap();
        assert_eq!(batch.members, vec![3]);
    }

    #[test]
    fn test_zero_timeout_flushes_immediately() {
        let mut batcher = MicroBatcher::new(16, Duration::ZERO);
        assert!(matches!(
            batcher.push(OperationKind::Embed, 1),
            PushOutcome::Full(_)
        ));
    }

    #[test]
    fn test_batch_size_one_flushes_immediately() {
        let mut batcher = MicroBatcher::new(1, WINDOW);
        assert!(matches!(
            batcher.push(OperationKind::EmbedBatch, 1),
            PushOutcome::Full(_)
        ));
    }

    #[test]
    fn test_drain() {
        let mut batcher = MicroBatcher::new(4, WINDOW);
        batcher.push(OperationKind::Embed, 1);
        batcher.push(OperationKind::EmbedBatch, 2);

        let batches = batcher.drain();
        assert_eq!(batches.len(), 2);
        assert_eq!(batcher.pending(), 0);
    }
}
