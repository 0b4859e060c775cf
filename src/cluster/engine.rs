//! Greedy agglomerative modularity clustering
//!
//! Every vertex starts in its own cluster. The engine keeps, for every live
//! cluster, the gain of merging it with its best neighbor in a max-heap, and
//! repeatedly merges the globally best pair until the best available gain is
//! negative (Clauset, Newman & Moore 2004; Wakita & Tsurumi 2007 for the
//! per-cluster heap key).

use crate::cluster::community::{Cluster, Merged};
use crate::cluster::heap::DeltaQHeap;
use crate::cluster::progress::{CancellationToken, ProgressUpdate};
use crate::cluster::{ClusterId, ClusterOutcome, MergeRecord, Partition};
use crate::config::Config;
use crate::error::{ClusterError, Result};
use crate::graph::ClusterGraph;

/// Partitions a graph by greedily maximizing modularity
#[derive(Debug, Clone, Default)]
pub struct ClusteringEngine {
    config: Config,
}

impl ClusteringEngine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cluster `graph` to completion without progress reporting
    pub fn cluster<G: ClusterGraph>(&self, graph: &G) -> Result<ClusterOutcome> {
        self.cluster_with(graph, &CancellationToken::new(), &mut |_| {})
    }

    /// Cluster `graph`, reporting progress and polling `cancel` every
    /// `progress_interval` merges.
    ///
    /// A cancelled run returns [`ClusterOutcome::Cancelled`] and discards
    /// everything merged so far.
    pub fn cluster_with<G: ClusterGraph>(
        &self,
        graph: &G,
        cancel: &CancellationToken,
        progress: &mut dyn FnMut(&ProgressUpdate),
    ) -> Result<ClusterOutcome> {
        let vertex_count = graph.vertex_count();
        let edge_count = graph.edge_count();
        log::info!(
            "Clustering graph with {} vertices and {} edges",
            vertex_count,
            edge_count
        );

        if vertex_count == 0 || edge_count == 0 {
            log::info!("Graph has no edges, returning {} singleton clusters", vertex_count);
            return Ok(ClusterOutcome::Completed(singletons(graph)));
        }

        let mut state = MergeState::build(graph)?;
        log::info!(
            "Initialized {} clusters, {} with neighbors",
            state.live,
            state.heap.len()
        );

        let interval = self.config.progress_interval;
        loop {
            let merges = state.merges.len();
            if merges % interval == 0 {
                let cancelled = cancel.is_cancelled();
                let update = ProgressUpdate::new(merges, state.live, cancelled);
                log::debug!("{}", update.message);
                progress(&update);
                if cancelled || cancel.is_cancelled() {
                    log::warn!("Clustering cancelled after {} merges", merges);
                    return Ok(ClusterOutcome::Cancelled);
                }
            }

            let Some((first, delta_q)) = state.heap.pop_max() else {
                break;
            };
            if delta_q < 0.0 {
                break;
            }
            state.merge(first, delta_q)?;

            #[cfg(any(test, feature = "invariant-checks"))]
            state.debug_check_invariants();
        }

        log::info!(
            "Finished after {} merges with {} clusters",
            state.merges.len(),
            state.live
        );
        Ok(ClusterOutcome::Completed(state.into_partition(&self.config)))
    }
}

/// One cluster per vertex, no merges
fn singletons<G: ClusterGraph>(graph: &G) -> Partition {
    let clusters = (0..graph.vertex_count())
        .map(|vertex| {
            let degree = graph.adjacent(vertex).count();
            (ClusterId::new(vertex), vec![vertex], degree)
        })
        .collect();
    Partition::from_clusters(graph.vertex_count(), clusters, Vec::new())
}

/// Mutable state of one clustering run
struct MergeState {
    /// Arena indexed by cluster id; `None` once merged away
    clusters: Vec<Option<Cluster>>,
    heap: DeltaQHeap,
    two_m: f64,
    live: usize,
    vertex_count: usize,
    /// Vertices with no neighbor other than themselves
    neighborless: Vec<bool>,
    merges: Vec<MergeRecord>,
}

impl MergeState {
    fn build<G: ClusterGraph>(graph: &G) -> Result<Self> {
        let vertex_count = graph.vertex_count();
        let two_m = 2.0 * graph.edge_count() as f64;

        let mut clusters = Vec::with_capacity(2 * vertex_count);
        for vertex in 0..vertex_count {
            let mut degree = 0;
            for neighbor in graph.adjacent(vertex) {
                if neighbor >= vertex_count {
                    return Err(ClusterError::VertexOutOfRange {
                        vertex,
                        neighbor,
                        vertex_count,
                    });
                }
                degree += 1;
            }
            clusters.push(Cluster::singleton(ClusterId::new(vertex), vertex, degree));
        }

        // Link both directions so a host with lopsided adjacency still
        // yields symmetric pairs.
        for vertex in 0..vertex_count {
            for neighbor in graph.adjacent(vertex) {
                if neighbor == vertex {
                    continue;
                }
                clusters[vertex].add_neighbor(ClusterId::new(neighbor));
                clusters[neighbor].add_neighbor(ClusterId::new(vertex));
            }
        }

        let degrees: Vec<usize> = clusters.iter().map(Cluster::degree).collect();
        let mut heap = DeltaQHeap::with_capacity(2 * vertex_count);
        let mut neighborless = vec![false; vertex_count];
        for (vertex, cluster) in clusters.iter_mut().enumerate() {
            let k_i = degrees[vertex];
            cluster.initialize_gains(|other| {
                let k_j = degrees[other.index()];
                1.0 / two_m - (k_i * k_j) as f64 / (two_m * two_m)
            });
            match cluster.best_pair() {
                Some(best) => heap.insert(cluster.id(), best.delta_q)?,
                None => neighborless[vertex] = true,
            }
        }

        Ok(Self {
            clusters: clusters.into_iter().map(Some).collect(),
            heap,
            two_m,
            live: vertex_count,
            vertex_count,
            neighborless,
            merges: Vec::new(),
        })
    }

    /// Merge the cluster just popped from the heap with its best neighbor
    fn merge(&mut self, first_id: ClusterId, delta_q: f64) -> Result<()> {
        let first = self.take(first_id);
        let Some(best) = first.best_pair().copied() else {
            panic!("cluster {} was in the heap without a best pair", first_id);
        };
        debug_assert_eq!(best.delta_q, delta_q, "heap key of {} is stale", first_id);

        let second_id = best.second;
        self.heap.remove(second_id);
        let second = self.take(second_id);

        let merged_id = ClusterId::new(self.clusters.len());
        let clusters = &self.clusters;
        let Merged { cluster, updates } =
            Cluster::merge(first, second, merged_id, self.two_m, |k| {
                live_cluster(clusters, k).degree()
            });

        for (k, pair_delta_q) in updates {
            let neighbor = self.live_mut(k);
            if let Some(key) = neighbor.on_merge_notify(first_id, second_id, merged_id, pair_delta_q) {
                self.heap.update_key(k, key);
            }
        }

        if let Some(best) = cluster.best_pair() {
            self.heap.insert(merged_id, best.delta_q)?;
        }
        self.clusters.push(Some(cluster));
        self.live -= 1;
        self.merges.push(MergeRecord {
            first: first_id,
            second: second_id,
            merged: merged_id,
            delta_q,
        });
        Ok(())
    }

    fn take(&mut self, id: ClusterId) -> Cluster {
        match self.clusters.get_mut(id.index()).and_then(Option::take) {
            Some(cluster) => cluster,
            None => panic!("cluster {} is not live", id),
        }
    }

    fn live_mut(&mut self, id: ClusterId) -> &mut Cluster {
        match self.clusters.get_mut(id.index()).and_then(Option::as_mut) {
            Some(cluster) => cluster,
            None => panic!("cluster {} is not live", id),
        }
    }

    fn into_partition(self, config: &Config) -> Partition {
        let neighborless = &self.neighborless;
        let is_neighborless = |cluster: &Cluster| {
            let members = cluster.members();
            members.len() == 1 && neighborless[members[0]]
        };

        let mut groups = Vec::with_capacity(self.live);
        let mut shared: Option<(ClusterId, Vec<usize>, usize)> = None;
        for cluster in self.clusters.into_iter().flatten() {
            if config.put_neighborless_vertices_in_one_cluster && is_neighborless(&cluster) {
                let entry = shared.get_or_insert_with(|| (cluster.id(), Vec::new(), 0));
                entry.2 += cluster.degree();
                entry.1.extend_from_slice(cluster.members());
                continue;
            }
            let id = cluster.id();
            let degree = cluster.degree();
            groups.push((id, cluster.into_members(), degree));
        }
        groups.extend(shared);

        Partition::from_clusters(self.vertex_count, groups, self.merges)
    }

    /// Assert that every cached value agrees with the data it summarizes
    #[cfg(any(test, feature = "invariant-checks"))]
    fn debug_check_invariants(&self) {
        self.heap.debug_check_invariants();

        let mut live = 0;
        let mut with_neighbors = 0;
        for cluster in self.clusters.iter().flatten() {
            live += 1;
            cluster.debug_check_invariants();

            for (&k, pair) in cluster.neighbors() {
                let other = live_cluster(&self.clusters, k);
                let Some(mirror) = other.neighbors().get(&cluster.id()) else {
                    panic!("cluster {} lists {} but not the other way round", cluster.id(), k);
                };
                assert_eq!(
                    mirror.delta_q.to_bits(),
                    pair.delta_q.to_bits(),
                    "pair {}-{} is asymmetric",
                    cluster.id(),
                    k
                );
            }

            match cluster.best_pair() {
                Some(best) => {
                    with_neighbors += 1;
                    assert_eq!(
                        self.heap.key_of(cluster.id()).map(f64::to_bits),
                        Some(best.delta_q.to_bits()),
                        "heap key of {} differs from its best pair",
                        cluster.id()
                    );
                }
                None => assert!(
                    !self.heap.contains(cluster.id()),
                    "cluster {} has no neighbors but is in the heap",
                    cluster.id()
                ),
            }
        }

        assert_eq!(live, self.live, "live cluster count drifted");
        assert_eq!(with_neighbors, self.heap.len(), "heap holds dead clusters");
        for (handle, _) in self.heap.iter() {
            live_cluster(&self.clusters, handle);
        }
    }
}

fn live_cluster(clusters: &[Option<Cluster>], id: ClusterId) -> &Cluster {
    match clusters.get(id.index()).and_then(Option::as_ref) {
        Some(cluster) => cluster,
        None => panic!("cluster {} is not live", id),
    }
}
