use core::cmp::Reverse;
use std::{collections::BinaryHeap, time::Duration};

/// A priority queue of scheduled items, keyed by virtual time.
///
/// Virtual time is expressed as the [`Duration`] elapsed since the start of
/// the simulation. Items scheduled for the same instant are popped in the
/// order they were pushed, so that a run is fully deterministic regardless
/// of how the underlying heap breaks ties.
pub struct TimeQueue<T> {
    heap: BinaryHeap<Reverse<Scheduled<T>>>,
    seq: u64,
}

struct Scheduled<T> {
    at: Duration,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the virtual time of the next scheduled item, if any.
    #[inline]
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|entry| entry.0.at)
    }

    /// Pop the earliest scheduled item along with its due time.
    pub fn pop(&mut self) -> Option<(Duration, T)> {
        self.heap.pop().map(|entry| (entry.0.at, entry.0.item))
    }

    /// Schedule `item` to come due at virtual time `at`.
    pub fn push(&mut self, at: Duration, item: T) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Scheduled { at, seq, item }))
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut queue = TimeQueue::<()>::new();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
        assert!(queue.next_due().is_none());
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = TimeQueue::new();
        queue.push(Duration::from_secs(10), "stop");
        queue.push(Duration::from_secs(1), "server start");
        queue.push(Duration::from_secs(2), "client start");

        assert_eq!(queue.next_due(), Some(Duration::from_secs(1)));
        assert_eq!(queue.pop(), Some((Duration::from_secs(1), "server start")));
        assert_eq!(queue.pop(), Some((Duration::from_secs(2), "client start")));
        assert_eq!(queue.pop(), Some((Duration::from_secs(10), "stop")));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn same_instant_is_fifo() {
        let mut queue = TimeQueue::new();
        let at = Duration::from_secs(2);
        queue.push(at, "first");
        queue.push(at, "second");
        queue.push(at, "third");

        assert_eq!(queue.pop(), Some((at, "first")));
        assert_eq!(queue.pop(), Some((at, "second")));
        assert_eq!(queue.pop(), Some((at, "third")));
    }
}
