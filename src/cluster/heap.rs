//! Indexed max-heap of clusters keyed by their best merge gain
//!
//! A plain `BinaryHeap` cannot re-key or remove an arbitrary entry, and the
//! merge loop needs both after every merge. Entries are addressed by
//! [`ClusterId`] through a dense position table, so every operation is
//! O(log n).
//!
//! Equal keys are ordered by insertion sequence: the entry inserted first
//! wins. Re-keying keeps the original sequence number.

use ordered_float::OrderedFloat;

use crate::cluster::ClusterId;
use crate::error::{ClusterError, Result};

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    handle: ClusterId,
    key: OrderedFloat<f64>,
    sequence: u64,
}

impl HeapEntry {
    /// Whether `self` belongs above `other`
    fn outranks(&self, other: &HeapEntry) -> bool {
        self.key > other.key || (self.key == other.key && self.sequence < other.sequence)
    }
}

/// Max-heap over cluster handles keyed by delta Q
#[derive(Debug, Clone, Default)]
pub struct DeltaQHeap {
    entries: Vec<HeapEntry>,
    /// positions[handle] = index into `entries`
    positions: Vec<Option<usize>>,
    next_sequence: u64,
}

impl DeltaQHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a heap sized for handles `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            next_sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: ClusterId) -> bool {
        self.position(handle).is_some()
    }

    /// Current key of `handle`, if present
    pub fn key_of(&self, handle: ClusterId) -> Option<f64> {
        self.position(handle).map(|pos| self.entries[pos].key.into_inner())
    }

    /// Add an entry; a handle may be present at most once
    pub fn insert(&mut self, handle: ClusterId, key: f64) -> Result<()> {
        if self.contains(handle) {
            return Err(ClusterError::DuplicateHandle(handle));
        }

        let slot = handle.index();
        if slot >= self.positions.len() {
            self.positions.resize(slot + 1, None);
        }

        let pos = self.entries.len();
        self.entries.push(HeapEntry {
            handle,
            key: OrderedFloat(key),
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        self.positions[slot] = Some(pos);
        self.sift_up(pos);
        Ok(())
    }

    /// Maximum entry without removing it
    pub fn peek_max(&self) -> Option<(ClusterId, f64)> {
        self.entries
            .first()
            .map(|entry| (entry.handle, entry.key.into_inner()))
    }

    /// Remove and return the maximum entry
    pub fn pop_max(&mut self) -> Option<(ClusterId, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = self.remove_at(0);
        Some((entry.handle, entry.key.into_inner()))
    }

    /// Remove the entry for `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not in the heap.
    pub fn remove(&mut self, handle: ClusterId) -> f64 {
        let pos = self.expect_position(handle, "remove");
        self.remove_at(pos).key.into_inner()
    }

    /// Change the key of `handle` in either direction.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not in the heap.
    pub fn update_key(&mut self, handle: ClusterId, key: f64) {
        let pos = self.expect_position(handle, "update_key");
        self.entries[pos].key = OrderedFloat(key);
        let pos = self.sift_up(pos);
        self.sift_down(pos);
    }

    /// Handles with their keys, in heap array order
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, f64)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.handle, entry.key.into_inner()))
    }

    fn position(&self, handle: ClusterId) -> Option<usize> {
        self.positions.get(handle.index()).copied().flatten()
    }

    fn expect_position(&self, handle: ClusterId, operation: &str) -> usize {
        match self.position(handle) {
            Some(pos) => pos,
            None => panic!("DeltaQHeap::{operation} called for cluster {handle}, which is not in the heap"),
        }
    }

    fn remove_at(&mut self, pos: usize) -> HeapEntry {
        let last = self.entries.len() - 1;
        self.swap(pos, last);
        let Some(entry) = self.entries.pop() else {
            unreachable!("heap emptied while removing position {pos}");
        };
        self.positions[entry.handle.index()] = None;

        if pos < self.entries.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }
        entry
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions[self.entries[a].handle.index()] = Some(a);
        self.positions[self.entries[b].handle.index()] = Some(b);
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.entries[pos].outranks(&self.entries[parent]) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut top = pos;
            if left < len && self.entries[left].outranks(&self.entries[top]) {
                top = left;
            }
            if right < len && self.entries[right].outranks(&self.entries[top]) {
                top = right;
            }
            if top == pos {
                return pos;
            }
            self.swap(pos, top);
            pos = top;
        }
    }

    /// Assert the heap ordering and the position table agree
    #[cfg(any(test, feature = "invariant-checks"))]
    pub(crate) fn debug_check_invariants(&self) {
        for (pos, entry) in self.entries.iter().enumerate() {
            assert_eq!(
                self.position(entry.handle),
                Some(pos),
                "position table out of sync for cluster {}",
                entry.handle
            );
            if pos > 0 {
                let parent = &self.entries[(pos - 1) / 2];
                assert!(
                    !entry.outranks(parent),
                    "cluster {} outranks its parent {}",
                    entry.handle,
                    parent.handle
                );
            }
        }
        let indexed = self.positions.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(indexed, self.entries.len(), "stale entries in position table");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ClusterId {
        ClusterId::new(n)
    }

    fn drain(heap: &mut DeltaQHeap) -> Vec<(usize, f64)> {
        let mut out = Vec::new();
        while let Some((handle, key)) = heap.pop_max() {
            heap.debug_check_invariants();
            out.push((handle.index(), key));
        }
        out
    }

    #[test]
    fn pops_in_descending_key_order() {
        let mut heap = DeltaQHeap::new();
        for (n, key) in [(0, 0.1), (1, 0.5), (2, -0.2), (3, 0.3), (4, 0.0)] {
            heap.insert(id(n), key).unwrap();
        }
        heap.debug_check_invariants();
        assert_eq!(heap.len(), 5);
        assert_eq!(heap.peek_max(), Some((id(1), 0.5)));
        let order: Vec<usize> = drain(&mut heap).into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![1, 3, 0, 4, 2]);
        assert!(heap.is_empty());
        assert_eq!(heap.pop_max(), None);
    }

    #[test]
    fn equal_keys_pop_in_insertion_order() {
        let mut heap = DeltaQHeap::new();
        for n in [7, 2, 9, 0, 5] {
            heap.insert(id(n), 0.25).unwrap();
        }
        let order: Vec<usize> = drain(&mut heap).into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![7, 2, 9, 0, 5]);
    }

    #[test]
    fn rekeyed_entry_keeps_its_insertion_rank() {
        let mut heap = DeltaQHeap::new();
        heap.insert(id(0), 0.1).unwrap();
        heap.insert(id(1), 0.4).unwrap();
        heap.insert(id(2), 0.2).unwrap();
        // 0 was inserted before 1, so it wins the tie after re-keying
        heap.update_key(id(0), 0.4);
        assert_eq!(heap.pop_max(), Some((id(0), 0.4)));
        assert_eq!(heap.pop_max(), Some((id(1), 0.4)));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut heap = DeltaQHeap::new();
        heap.insert(id(3), 1.0).unwrap();
        assert_eq!(
            heap.insert(id(3), 2.0),
            Err(ClusterError::DuplicateHandle(id(3)))
        );
        assert_eq!(heap.key_of(id(3)), Some(1.0));
    }

    #[test]
    fn update_key_moves_entries_both_ways() {
        let mut heap = DeltaQHeap::with_capacity(4);
        for (n, key) in [(0, 0.4), (1, 0.3), (2, 0.2), (3, 0.1)] {
            heap.insert(id(n), key).unwrap();
        }
        heap.update_key(id(3), 0.9);
        heap.debug_check_invariants();
        heap.update_key(id(0), -1.0);
        heap.debug_check_invariants();
        assert_eq!(heap.key_of(id(0)), Some(-1.0));
        let order: Vec<usize> = drain(&mut heap).into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
    }

    #[test]
    fn remove_arbitrary_handles() {
        let mut heap = DeltaQHeap::new();
        for n in 0..10 {
            heap.insert(id(n), n as f64 * 0.1).unwrap();
        }
        assert!((heap.remove(id(4)) - 0.4).abs() < 1e-12);
        assert!((heap.remove(id(9)) - 0.9).abs() < 1e-12);
        heap.remove(id(0));
        heap.debug_check_invariants();
        assert!(!heap.contains(id(4)));
        assert_eq!(heap.len(), 7);
        let order: Vec<usize> = drain(&mut heap).into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![8, 7, 6, 5, 3, 2, 1]);
    }

    #[test]
    fn removed_handle_can_be_reinserted() {
        let mut heap = DeltaQHeap::new();
        heap.insert(id(1), 0.5).unwrap();
        heap.remove(id(1));
        heap.insert(id(1), 0.7).unwrap();
        assert_eq!(heap.peek_max(), Some((id(1), 0.7)));
    }

    #[test]
    #[should_panic(expected = "not in the heap")]
    fn removing_absent_handle_panics() {
        let mut heap = DeltaQHeap::new();
        heap.insert(id(0), 0.5).unwrap();
        heap.remove(id(1));
    }

    #[test]
    #[should_panic(expected = "not in the heap")]
    fn updating_absent_handle_panics() {
        let mut heap = DeltaQHeap::new();
        heap.update_key(id(2), 0.5);
    }
}
