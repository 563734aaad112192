//! Priority ready queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use mnemo_protocols::RequestPriority;

/// Wrapper for priority queue ordering.
struct Prioritized<T> {
    priority: RequestPriority,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Prioritized<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for Prioritized<T> {}

impl<T> PartialOrd for Prioritized<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Prioritized<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then earlier insertion
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// Max-priority queue, FIFO within equal priority.
pub struct ReadyQueue<T> {
    heap: BinaryHeap<Prioritized<T>>,
    next_seq: u64,
}

impl<T> ReadyQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, priority: RequestPriority, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Prioritized { priority, seq, item });
    }

    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|entry| &entry.item)
    }

    /// Remove every entry, in no particular order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.heap.drain().map(|entry| entry.item)
    }
}

impl<T> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        let mut queue = ReadyQueue::new();
        queue.push(RequestPriority::Low, "low");
        queue.push(RequestPriority::Critical, "critical");
        queue.push(RequestPriority::Normal, "normal");
        queue.push(RequestPriority::High, "high");

        assert_eq!(queue.pop(), Some("critical"));
        assert_eq!(queue.pop(), Some("high"));
        assert_eq!(queue.pop(), Some("normal"));
        assert_eq!(queue.pop(), Some("low"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut queue = ReadyQueue::new();
        for i in 0..5 {
            queue.push(RequestPriority::Normal, i);
        }
        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_len_and_drain() {
        let mut queue = ReadyQueue::new();
        queue.push(RequestPriority::Normal, 1);
        queue.push(RequestPriority::High, 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.iter().count(), 2);

        let mut drained: Vec<_> = queue.drain().collect();
        drained.sort();
        assert_eq!(drained, vec![1, 2]);
        assert!(queue.is_empty());
    }
}
