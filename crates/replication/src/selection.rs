//! Bounded top-K selection of the cheapest nodes.
//!
//! # Algorithm
//!
//! Keep a max-heap of at most `k` samples ordered by cost. Push every
//! sample; whenever the heap grows past `k`, pop its maximum. What remains
//! are the `k` cheapest samples seen.
//!
//! # Performance
//!
//! - **Time**: O(n log k) for n samples
//! - **Space**: O(k)
//!
//! Ties between equal costs are broken arbitrarily; callers must not rely on
//! which of several equally cheap nodes survives.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cost::CostSample;

/// Heap entry ordered by cost only.
#[derive(Debug)]
struct ByCost(CostSample);

impl PartialEq for ByCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByCost {}

impl PartialOrd for ByCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByCost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cost.total_cmp(&other.0.cost)
    }
}

/// Max-heap holding at most `capacity` samples, evicting the most expensive.
#[derive(Debug)]
pub struct BoundedMaxHeap {
    capacity: usize,
    heap: BinaryHeap<ByCost>,
}

impl BoundedMaxHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            // one extra slot for the element pushed just before eviction
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1).min(1024)),
        }
    }

    /// Insert `sample`, returning whichever sample was evicted to stay within
    /// capacity (possibly `sample` itself).
    pub fn push(&mut self, sample: CostSample) -> Option<CostSample> {
        self.heap.push(ByCost(sample));
        if self.heap.len() > self.capacity {
            return self.heap.pop().map(|entry| entry.0);
        }
        None
    }

    /// Most expensive sample currently held.
    pub fn peek_max(&self) -> Option<&CostSample> {
        self.heap.peek().map(|entry| &entry.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a vector, cheapest first.
    pub fn into_sorted_vec(self) -> Vec<CostSample> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| entry.0)
            .collect()
    }
}

/// The `k` cheapest samples, cheapest first.
///
/// Returns every sample when there are `k` or fewer.
pub fn select_lowest(samples: impl IntoIterator<Item = CostSample>, k: usize) -> Vec<CostSample> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap = BoundedMaxHeap::new(k);
    for sample in samples {
        heap.push(sample);
    }
    heap.into_sorted_vec()
}
