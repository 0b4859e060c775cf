//! Memory-efficient undirected graph representation

use std::iter::{Copied, Map};
use std::mem;
use std::slice::Iter;

use serde::{Deserialize, Serialize};

use crate::graph::ClusterGraph;

/// Compressed sparse representation of an undirected multigraph.
///
/// Every undirected edge `{u, v}` is stored twice, once in each endpoint's
/// list. A self-loop is stored once in its vertex's list. Parallel edges are
/// kept as separate entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Number of undirected edges, self-loops and parallel edges included
    pub edge_count: usize,

    /// Offset array: index where each node's edges begin
    /// offsets[i] to offsets[i+1] defines the edge range for node i
    pub offsets: Vec<u32>,

    /// Edge array: concatenated adjacency lists
    pub edges: Vec<u32>,

    /// Optional mapping from internal node IDs to original string IDs
    pub node_ids: Option<Vec<String>>,
}

impl CompressedGraph {
    /// Create a new graph with pre-allocated capacity
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            edge_count: 0,
            offsets: Vec::with_capacity(node_count + 1),
            edges: Vec::with_capacity(edge_count * 2),
            node_ids: None,
        }
    }

    /// Build a graph over `node_count` vertices from index pairs
    pub fn from_edges(node_count: usize, edges: &[(u32, u32)]) -> Self {
        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        for &(src, dst) in edges {
            adjacency[src as usize].push(dst);
            if src != dst {
                adjacency[dst as usize].push(src);
            }
        }

        let mut graph = Self::with_capacity(node_count, edges.len());
        graph.offsets.push(0);
        let mut offset = 0;
        for list in adjacency {
            offset += list.len() as u32;
            graph.edges.extend(list);
            graph.offsets.push(offset);
        }
        graph.edge_count = edges.len();
        graph
    }

    /// Get the adjacency list of a node
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Sort all adjacency lists (improves binary search performance)
    pub fn sort_adjacency_lists(&mut self) {
        for node in 0..self.node_count {
            let start = self.offsets[node] as usize;
            let end = self.offsets[node + 1] as usize;
            if start < end {
                self.edges[start..end].sort_unstable();
            }
        }
    }

    /// Check if there's an edge between src and dst
    ///
    /// Requires sorted adjacency lists.
    pub fn has_edge(&self, src: usize, dst: u32) -> bool {
        self.neighbors(src).binary_search(&dst).is_ok()
    }

    /// Number of adjacency entries of a node (a self-loop counts once)
    pub fn degree(&self, node: usize) -> usize {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        end - start
    }

    /// Display label for a node, falling back to its index
    pub fn label(&self, node: usize) -> String {
        match self.node_ids {
            Some(ref ids) => ids[node].clone(),
            None => node.to_string(),
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<u32>();
        let edges = self.edges.capacity() * mem::size_of::<u32>();

        let ids = self
            .node_ids
            .as_ref()
            .map(|ids| ids.iter().map(|s| s.capacity()).sum::<usize>())
            .unwrap_or(0);

        base + offsets + edges + ids
    }
}

fn widen(index: u32) -> usize {
    index as usize
}

impl ClusterGraph for CompressedGraph {
    type Adjacent<'a> = Map<Copied<Iter<'a, u32>>, fn(u32) -> usize>;

    fn vertex_count(&self) -> usize {
        self.node_count
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn adjacent(&self, vertex: usize) -> Self::Adjacent<'_> {
        self.neighbors(vertex)
            .iter()
            .copied()
            .map(widen as fn(u32) -> usize)
    }
}
