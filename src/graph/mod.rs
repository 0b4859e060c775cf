//! Graph representation and the input contract of the clustering engine

pub mod builder;
pub mod compressed;

use std::iter::Map;

use petgraph::graph::{Neighbors, NodeIndex, UnGraph};

pub use builder::GraphBuilder;
pub use compressed::CompressedGraph;

/// Read-only view of an undirected host graph.
///
/// Vertices are the stable enumeration `0..vertex_count()`. `adjacent`
/// yields every adjacency entry as the host stores it, so self-loops and
/// parallel edges show up as separate entries.
pub trait ClusterGraph {
    type Adjacent<'a>: Iterator<Item = usize>
    where
        Self: 'a;

    fn vertex_count(&self) -> usize;

    /// Total number of edges `m`, self-loops and parallel edges included
    fn edge_count(&self) -> usize;

    fn adjacent(&self, vertex: usize) -> Self::Adjacent<'_>;
}

fn node_position(node: NodeIndex) -> usize {
    node.index()
}

impl<N, E> ClusterGraph for UnGraph<N, E> {
    type Adjacent<'a> = Map<Neighbors<'a, E>, fn(NodeIndex) -> usize>
    where
        Self: 'a;

    fn vertex_count(&self) -> usize {
        self.node_count()
    }

    fn edge_count(&self) -> usize {
        self.raw_edges().len()
    }

    fn adjacent(&self, vertex: usize) -> Self::Adjacent<'_> {
        self.neighbors(NodeIndex::new(vertex))
            .map(node_position as fn(NodeIndex) -> usize)
    }
}
