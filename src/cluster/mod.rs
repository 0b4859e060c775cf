//! Agglomerative modularity clustering

pub mod appearance;
pub mod community;
pub mod engine;
pub mod heap;
pub mod metrics;
pub mod progress;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use appearance::{appearance, Appearance, Color, Shape};
pub use engine::ClusteringEngine;
pub use heap::DeltaQHeap;
pub use progress::{CancellationToken, ProgressUpdate};

/// Stable identity of a cluster. Ids are assigned in increasing order and
/// never reused: singletons get `0..n` in vertex order, merged clusters
/// continue from `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(usize);

impl ClusterId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One merge performed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Cluster popped from the heap
    pub first: ClusterId,
    /// Its best neighbor at that moment
    pub second: ClusterId,
    /// The cluster produced by the merge
    pub merged: ClusterId,
    /// Gain of the merge when it was performed
    pub delta_q: f64,
}

/// One cluster of the final partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Position of this group in `Partition::groups`
    pub index: usize,

    /// Id of the surviving cluster
    pub cluster_id: ClusterId,

    /// Member vertices, in merge order
    pub members: Vec<usize>,

    /// Sum of member degrees
    pub degree: usize,

    /// Rendering attributes derived from `index`
    pub appearance: Appearance,
}

impl Group {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Assignment of every vertex to exactly one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub groups: Vec<Group>,

    /// assignment[vertex] = index of the vertex's group
    pub assignment: Vec<usize>,

    /// Merges in the order they were performed
    pub merges: Vec<MergeRecord>,
}

impl Partition {
    /// Build groups from member lists, deriving indices and appearances
    pub(crate) fn from_clusters(
        vertex_count: usize,
        clusters: Vec<(ClusterId, Vec<usize>, usize)>,
        merges: Vec<MergeRecord>,
    ) -> Self {
        let total = clusters.len();
        let mut assignment = vec![usize::MAX; vertex_count];
        let groups: Vec<Group> = clusters
            .into_iter()
            .enumerate()
            .map(|(index, (cluster_id, members, degree))| {
                for &vertex in &members {
                    assignment[vertex] = index;
                }
                Group {
                    index,
                    cluster_id,
                    members,
                    degree,
                    appearance: appearance(index, total),
                }
            })
            .collect();

        debug_assert!(
            assignment.iter().all(|&group| group != usize::MAX),
            "partition leaves a vertex unassigned"
        );

        Self {
            groups,
            assignment,
            merges,
        }
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group of a vertex
    pub fn group_of(&self, vertex: usize) -> &Group {
        &self.groups[self.assignment[vertex]]
    }
}

/// How a clustering run ended
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterOutcome {
    Completed(Partition),
    /// The cancellation token was set; no partition is produced
    Cancelled,
}

impl ClusterOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClusterOutcome::Cancelled)
    }

    pub fn into_partition(self) -> Option<Partition> {
        match self {
            ClusterOutcome::Completed(partition) => Some(partition),
            ClusterOutcome::Cancelled => None,
        }
    }
}
