use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// A max-heap of values keyed by a float score.
pub struct PriorityQueue<T> {
    heap: BinaryHeap<PriorityQueueEntry<T>>,
}

impl<T> PriorityQueue<T>
where
    T: Eq,
    T: PartialEq,
{
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: T, score: f64) {
        self.heap.push(PriorityQueueEntry {
            score: OrderedFloat(score),
            value,
        });
    }

    /// Remove the value with the highest score.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|n| n.value)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for PriorityQueue<T>
where
    T: Eq,
    T: PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct PriorityQueueEntry<T> {
    score: OrderedFloat<f64>,
    value: T,
}

impl<T> Ord for PriorityQueueEntry<T>
where
    T: Eq,
    T: PartialEq,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl<T> PartialOrd for PriorityQueueEntry<T>
where
    T: Eq,
    T: PartialEq,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
