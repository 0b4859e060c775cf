//! Clusters under agglomeration and the per-merge neighbor bookkeeping
//!
//! Each live [`Cluster`] keeps a map from neighbor cluster id to the
//! [`ClusterPair`] describing the gain of merging with that neighbor, plus a
//! cached pointer to the best pair. Merging two clusters joins their sorted
//! neighbor maps in one pass (Clauset, Newman & Moore 2004, equations 10a-c)
//! and produces the list of third-party clusters whose pair must be
//! re-pointed at the merged cluster.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;

use serde::Serialize;

use crate::cluster::ClusterId;

/// Gain of merging two specific clusters.
///
/// `first` is always the cluster whose neighbor map holds the pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterPair {
    pub first: ClusterId,
    pub second: ClusterId,
    pub delta_q: f64,
}

impl ClusterPair {
    pub fn new(first: ClusterId, second: ClusterId, delta_q: f64) -> Self {
        Self {
            first,
            second,
            delta_q,
        }
    }
}

/// A set of vertices treated as one unit by the merge loop
#[derive(Debug, Clone)]
pub struct Cluster {
    id: ClusterId,
    members: Vec<usize>,
    /// Sum of member degrees in the original graph
    degree: usize,
    neighbors: BTreeMap<ClusterId, ClusterPair>,
    best_pair: Option<ClusterId>,
}

/// Where a neighbor of a merged cluster came from
#[derive(Debug, Clone, Copy, PartialEq)]
enum Adjacency {
    First(f64),
    Second(f64),
    Both(f64, f64),
}

/// Result of [`Cluster::merge`]
#[derive(Debug)]
pub struct Merged {
    pub cluster: Cluster,
    /// Every third-party neighbor with its recomputed gain, in id order
    pub updates: Vec<(ClusterId, f64)>,
}

impl Cluster {
    /// Singleton cluster for one vertex
    pub fn singleton(id: ClusterId, vertex: usize, degree: usize) -> Self {
        Self {
            id,
            members: vec![vertex],
            degree,
            neighbors: BTreeMap::new(),
            best_pair: None,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn into_members(self) -> Vec<usize> {
        self.members
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn neighbors(&self) -> &BTreeMap<ClusterId, ClusterPair> {
        &self.neighbors
    }

    pub fn has_neighbors(&self) -> bool {
        !self.neighbors.is_empty()
    }

    /// The pair with the largest gain, if the cluster has any neighbor
    pub fn best_pair(&self) -> Option<&ClusterPair> {
        self.best_pair.map(|other| self.pair_with(other))
    }

    /// Register a neighbor during initialization. Parallel edges collapse
    /// into the pair already present; the gain is computed once all
    /// degrees are known.
    pub fn add_neighbor(&mut self, other: ClusterId) {
        let id = self.id;
        self.neighbors
            .entry(other)
            .or_insert_with(|| ClusterPair::new(id, other, 0.0));
    }

    /// Assign initial gains and pick the best pair.
    ///
    /// `gain` receives the neighbor id and returns the pair's delta Q.
    pub fn initialize_gains(&mut self, mut gain: impl FnMut(ClusterId) -> f64) {
        for (&other, pair) in self.neighbors.iter_mut() {
            pair.delta_q = gain(other);
        }
        self.rescan_best_pair();
    }

    /// Merge `a` and `b` into a new cluster called `id`.
    ///
    /// Neighbor maps are joined in ascending id order. A neighbor shared by
    /// both sides gets the sum of both gains; a neighbor of only one side
    /// loses `2 * a_other * a_k`, where `a_x` is cluster `x`'s share of the
    /// total degree `two_m`. `degree_of` looks up the degree of a neighbor
    /// cluster.
    pub fn merge(
        a: Cluster,
        b: Cluster,
        id: ClusterId,
        two_m: f64,
        degree_of: impl Fn(ClusterId) -> usize,
    ) -> Merged {
        let share = |degree: usize| degree as f64 / two_m;
        let a_share = share(a.degree);
        let b_share = share(b.degree);

        let mut neighbors = BTreeMap::new();
        let mut updates = Vec::with_capacity(a.neighbors.len() + b.neighbors.len());
        let mut best: Option<(ClusterId, f64)> = None;

        for (k, adjacency) in join_neighbors(&a.neighbors, &b.neighbors) {
            if k == a.id || k == b.id {
                continue;
            }
            let delta_q = match adjacency {
                Adjacency::Both(from_a, from_b) => from_a + from_b,
                Adjacency::First(from_a) => from_a - 2.0 * b_share * share(degree_of(k)),
                Adjacency::Second(from_b) => from_b - 2.0 * a_share * share(degree_of(k)),
            };
            neighbors.insert(k, ClusterPair::new(id, k, delta_q));
            updates.push((k, delta_q));
            if best.map_or(true, |(_, top)| delta_q > top) {
                best = Some((k, delta_q));
            }
        }

        let mut members = a.members;
        members.extend(b.members);

        Merged {
            cluster: Cluster {
                id,
                members,
                degree: a.degree + b.degree,
                neighbors,
                best_pair: best.map(|(k, _)| k),
            },
            updates,
        }
    }

    /// Replace the pairs pointing at `old1` and/or `old2` with one pair
    /// pointing at `merged`.
    ///
    /// Returns the new heap key when the best pair changed, `None` when the
    /// key this cluster holds in the heap is still correct.
    ///
    /// # Panics
    ///
    /// Panics if this cluster has no best pair, or knew neither old cluster.
    pub fn on_merge_notify(
        &mut self,
        old1: ClusterId,
        old2: ClusterId,
        merged: ClusterId,
        delta_q: f64,
    ) -> Option<f64> {
        let Some(previous_best) = self.best_pair else {
            panic!("cluster {} has neighbors but no best pair", self.id);
        };
        let previous_top = self.pair_with(previous_best).delta_q;

        let removed_first = self.neighbors.remove(&old1).is_some();
        let removed_second = self.neighbors.remove(&old2).is_some();
        assert!(
            removed_first || removed_second,
            "cluster {} was notified about {} and {} without neighboring either",
            self.id,
            old1,
            old2
        );
        self.neighbors
            .insert(merged, ClusterPair::new(self.id, merged, delta_q));

        let best_removed = previous_best == old1 || previous_best == old2;
        if delta_q > previous_top {
            // Everything else is at most the previous top
            self.best_pair = Some(merged);
            return Some(delta_q);
        }
        if !best_removed {
            return None;
        }

        self.rescan_best_pair();
        self.best_pair().map(|pair| pair.delta_q)
    }

    /// Linear scan in id order; the first of equal maxima wins
    fn rescan_best_pair(&mut self) {
        let mut best: Option<&ClusterPair> = None;
        for pair in self.neighbors.values() {
            if best.map_or(true, |top| pair.delta_q > top.delta_q) {
                best = Some(pair);
            }
        }
        self.best_pair = best.map(|pair| pair.second);
    }

    fn pair_with(&self, other: ClusterId) -> &ClusterPair {
        match self.neighbors.get(&other) {
            Some(pair) => pair,
            None => panic!(
                "cluster {} points its best pair at {}, which is not a neighbor",
                self.id, other
            ),
        }
    }

    /// Assert the cached best pair and the neighbor map agree
    #[cfg(any(test, feature = "invariant-checks"))]
    pub(crate) fn debug_check_invariants(&self) {
        assert!(!self.members.is_empty(), "cluster {} has no members", self.id);
        assert!(
            !self.neighbors.contains_key(&self.id),
            "cluster {} lists itself as a neighbor",
            self.id
        );
        let mut previous: Option<ClusterId> = None;
        for (&key, pair) in &self.neighbors {
            assert!(previous.map_or(true, |p| p < key), "neighbor map of {} is unsorted", self.id);
            assert_eq!(pair.first, self.id);
            assert_eq!(pair.second, key);
            previous = Some(key);
        }

        let mut expected = self.clone();
        expected.rescan_best_pair();
        assert_eq!(
            self.best_pair, expected.best_pair,
            "cluster {} caches the wrong best pair",
            self.id
        );
    }
}

/// Ordered merge-join of two neighbor maps
fn join_neighbors<'a>(
    first: &'a BTreeMap<ClusterId, ClusterPair>,
    second: &'a BTreeMap<ClusterId, ClusterPair>,
) -> impl Iterator<Item = (ClusterId, Adjacency)> + 'a {
    JoinNeighbors {
        first: first.iter().peekable(),
        second: second.iter().peekable(),
    }
}

type PairIter<'a> = std::collections::btree_map::Iter<'a, ClusterId, ClusterPair>;

struct JoinNeighbors<'a> {
    first: Peekable<PairIter<'a>>,
    second: Peekable<PairIter<'a>>,
}

impl Iterator for JoinNeighbors<'_> {
    type Item = (ClusterId, Adjacency);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.first.peek(), self.second.peek()) {
            (None, None) => return None,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((a, _)), Some((b, _))) => a.cmp(b),
        };
        match order {
            Ordering::Less => {
                let (&k, pair) = self.first.next()?;
                Some((k, Adjacency::First(pair.delta_q)))
            }
            Ordering::Greater => {
                let (&k, pair) = self.second.next()?;
                Some((k, Adjacency::Second(pair.delta_q)))
            }
            Ordering::Equal => {
                let (&k, a) = self.first.next()?;
                let (_, b) = self.second.next()?;
                Some((k, Adjacency::Both(a.delta_q, b.delta_q)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ClusterId {
        ClusterId::new(n)
    }

    fn cluster_with(n: usize, degree: usize, gains: &[(usize, f64)]) -> Cluster {
        let mut cluster = Cluster::singleton(id(n), n, degree);
        for &(other, _) in gains {
            cluster.add_neighbor(id(other));
        }
        cluster.initialize_gains(|other| {
            gains
                .iter()
                .find(|(k, _)| id(*k) == other)
                .map(|&(_, g)| g)
                .unwrap()
        });
        cluster
    }

    #[test]
    fn parallel_edges_collapse_into_one_pair() {
        let mut cluster = Cluster::singleton(id(0), 0, 3);
        cluster.add_neighbor(id(1));
        cluster.add_neighbor(id(1));
        cluster.add_neighbor(id(2));
        assert_eq!(cluster.neighbors().len(), 2);
    }

    #[test]
    fn best_pair_prefers_lowest_id_among_ties() {
        let cluster = cluster_with(0, 3, &[(4, 0.2), (2, 0.2), (3, 0.1)]);
        assert_eq!(cluster.best_pair().map(|p| p.second), Some(id(2)));
        cluster.debug_check_invariants();
    }

    #[test]
    fn merge_applies_all_three_update_rules() {
        // a = 0 (degree 2) neighbors 1, 2, 3; b = 1 (degree 4) neighbors 0, 3, 4
        let degrees = [2usize, 4, 1, 3, 2];
        let a = cluster_with(0, 2, &[(1, 0.05), (2, 0.03), (3, 0.02)]);
        let b = cluster_with(1, 4, &[(0, 0.05), (3, 0.04), (4, 0.01)]);
        let two_m = 12.0;

        let merged = Cluster::merge(a, b, id(5), two_m, |k| degrees[k.index()]);
        let cluster = merged.cluster;

        assert_eq!(cluster.id(), id(5));
        assert_eq!(cluster.members(), &[0, 1]);
        assert_eq!(cluster.degree(), 6);
        let keys: Vec<usize> = cluster.neighbors().keys().map(|k| k.index()).collect();
        assert_eq!(keys, vec![2, 3, 4]);

        let only_a = 0.03 - 2.0 * (4.0 / 12.0) * (1.0 / 12.0);
        let both = 0.02 + 0.04;
        let only_b = 0.01 - 2.0 * (2.0 / 12.0) * (2.0 / 12.0);
        assert_eq!(merged.updates, vec![(id(2), only_a), (id(3), both), (id(4), only_b)]);
        assert_eq!(cluster.best_pair().map(|p| p.second), Some(id(3)));
        cluster.debug_check_invariants();
    }

    #[test]
    fn merge_of_isolated_pair_has_no_neighbors() {
        let a = cluster_with(0, 1, &[(1, 0.25)]);
        let b = cluster_with(1, 1, &[(0, 0.25)]);
        let merged = Cluster::merge(a, b, id(2), 2.0, |_| 0);
        assert!(!merged.cluster.has_neighbors());
        assert!(merged.cluster.best_pair().is_none());
        assert!(merged.updates.is_empty());
    }

    #[test]
    fn notify_keeps_best_when_untouched() {
        let mut k = cluster_with(9, 3, &[(0, 0.1), (1, 0.02), (4, 0.3)]);
        let key = k.on_merge_notify(id(0), id(1), id(10), 0.2);
        assert_eq!(key, None);
        assert_eq!(k.best_pair().map(|p| p.second), Some(id(4)));
        assert!(!k.neighbors().contains_key(&id(0)));
        assert!(!k.neighbors().contains_key(&id(1)));
        k.debug_check_invariants();
    }

    #[test]
    fn notify_promotes_larger_merged_pair() {
        let mut k = cluster_with(9, 3, &[(0, 0.1), (4, 0.3)]);
        let key = k.on_merge_notify(id(0), id(1), id(10), 0.5);
        assert_eq!(key, Some(0.5));
        assert_eq!(k.best_pair().map(|p| p.second), Some(id(10)));
        k.debug_check_invariants();
    }

    #[test]
    fn notify_keeps_earlier_pair_on_tie() {
        let mut k = cluster_with(9, 3, &[(0, 0.1), (4, 0.3)]);
        assert_eq!(k.on_merge_notify(id(0), id(1), id(10), 0.3), None);
        assert_eq!(k.best_pair().map(|p| p.second), Some(id(4)));
    }

    #[test]
    fn notify_rescans_when_best_was_removed() {
        let mut k = cluster_with(9, 3, &[(0, 0.4), (1, 0.1), (4, 0.3)]);
        let key = k.on_merge_notify(id(0), id(1), id(10), 0.2);
        assert_eq!(key, Some(0.3));
        assert_eq!(k.best_pair().map(|p| p.second), Some(id(4)));
        assert_eq!(k.neighbors().len(), 2);
        k.debug_check_invariants();
    }

    #[test]
    fn notify_rescan_prefers_survivor_on_tie() {
        let mut k = cluster_with(9, 3, &[(0, 0.4), (4, 0.3)]);
        assert_eq!(k.on_merge_notify(id(0), id(1), id(10), 0.3), Some(0.3));
        assert_eq!(k.best_pair().map(|p| p.second), Some(id(4)));
        k.debug_check_invariants();
    }

    #[test]
    #[should_panic(expected = "without neighboring either")]
    fn notify_from_strangers_panics() {
        let mut k = cluster_with(9, 3, &[(4, 0.3)]);
        k.on_merge_notify(id(0), id(1), id(10), 0.3);
    }
}
