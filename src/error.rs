//! Error types for the clustering library

use crate::cluster::ClusterId;
use thiserror::Error;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Recoverable failures surfaced by the clustering engine.
///
/// Broken internal invariants (a heap entry for a dead cluster, a cluster
/// with neighbors but no best pair) are not represented here; those panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A handle was inserted into the delta-Q heap twice
    #[error("cluster {0} is already present in the delta-Q heap")]
    DuplicateHandle(ClusterId),

    /// The host graph reported a neighbor outside its vertex range
    #[error("vertex {vertex} lists neighbor {neighbor}, but the graph only has {vertex_count} vertices")]
    VertexOutOfRange {
        vertex: usize,
        neighbor: usize,
        vertex_count: usize,
    },

    /// Configuration values the engine cannot run with
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
