//! This module contains utility structures for managing k-best elements using a binary heap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use ordered_float::OrderedFloat; // For using f64 in BinaryHeap

/// Represents an element in the KBestNeighbors heap, pairing a distance with data.
///
/// `index` is the position of the candidate in the searched collection. It breaks
/// distance ties so that the ordering is total.
#[derive(Debug)]
pub struct HeapElement<P> {
    pub distance: OrderedFloat<f64>,
    pub index: usize,
    pub data: P,
}

impl<P> HeapElement<P> {
    fn key(&self) -> (OrderedFloat<f64>, usize) {
        (self.distance, self.index)
    }
}

impl<P> PartialEq for HeapElement<P> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl<P> Eq for HeapElement<P> {}

impl<P> PartialOrd for HeapElement<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for HeapElement<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: the worst of the kept candidates sits on top.
        self.key().cmp(&other.key())
    }
}

/// Keeps the `capacity` candidates with the smallest `(distance, index)` seen so far.
#[derive(Debug)]
pub struct KBestNeighbors<P> {
    capacity: usize,
    heap: BinaryHeap<HeapElement<P>>,
}

impl<P> KBestNeighbors<P> {
    pub fn new(capacity: usize) -> Self {
        KBestNeighbors {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, distance: f64, index: usize, data: P) {
        if self.capacity == 0 {
            return;
        }
        let item = HeapElement { distance: OrderedFloat(distance), index, data };
        if self.heap.len() < self.capacity {
            self.heap.push(item);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if item < *worst {
                *worst = item; // PeekMut restores the heap order on drop
            }
        }
    }

    /// Consumes the collection, returning the kept candidates nearest first.
    pub fn into_sorted_points(self) -> Vec<P> {
        self.heap.into_sorted_vec().into_iter().map(|elem| elem.data).collect()
    }

    /// Returns the current number of neighbors stored.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
