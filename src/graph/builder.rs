//! Graph construction module

use crate::graph::CompressedGraph;
use std::collections::HashMap;

/// Builder for incrementally constructing an undirected CompressedGraph
/// from string-labelled vertices
pub struct GraphBuilder {
    /// Number of nodes
    node_count: usize,

    /// Number of edges added so far
    edge_count: usize,

    /// Mapping from string IDs to node indices
    id_to_index: HashMap<String, u32>,

    /// Node string IDs, in first-seen order
    node_ids: Vec<String>,

    /// Adjacency lists for each node
    adjacency_lists: Vec<Vec<u32>>,
}

impl GraphBuilder {
    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            adjacency_lists: Vec::with_capacity(capacity),
        }
    }

    /// Get or create a node ID for the given string ID
    pub fn get_or_create_node(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_count as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());
        self.adjacency_lists.push(Vec::new());
        self.node_count += 1;

        idx
    }

    /// Register a vertex that may end up without edges
    pub fn add_vertex(&mut self, id: &str) -> u32 {
        self.get_or_create_node(id)
    }

    /// Add an undirected edge; a self-loop is recorded once
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str) {
        let src_idx = self.get_or_create_node(src_id);
        let dst_idx = self.get_or_create_node(dst_id);

        self.adjacency_lists[src_idx as usize].push(dst_idx);
        if src_idx != dst_idx {
            self.adjacency_lists[dst_idx as usize].push(src_idx);
        }
        self.edge_count += 1;
    }

    /// Number of vertices registered so far
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Build the compressed graph
    pub fn build(mut self) -> CompressedGraph {
        let entry_count: usize = self.adjacency_lists.iter().map(|list| list.len()).sum();

        let mut offsets = Vec::with_capacity(self.node_count + 1);
        offsets.push(0);

        let mut offset = 0;
        for list in &self.adjacency_lists {
            offset += list.len() as u32;
            offsets.push(offset);
        }

        let mut edges = Vec::with_capacity(entry_count);
        for list in &mut self.adjacency_lists {
            // Sort for binary search efficiency
            list.sort_unstable();
            edges.extend_from_slice(list);
        }

        log::debug!(
            "Built graph with {} nodes, {} edges ({} adjacency entries)",
            self.node_count,
            self.edge_count,
            entry_count
        );

        CompressedGraph {
            node_count: self.node_count,
            edge_count: self.edge_count,
            offsets,
            edges,
            node_ids: Some(self.node_ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_indexed_in_first_seen_order() {
        let mut builder = GraphBuilder::with_capacity(4);
        builder.add_edge("carol", "alice");
        builder.add_edge("alice", "bob");
        builder.add_vertex("dave");
        assert_eq!(builder.node_count(), 4);

        let graph = builder.build();
        assert_eq!(
            graph.node_ids.as_deref(),
            Some(&["carol".to_string(), "alice".to_string(), "bob".to_string(), "dave".to_string()][..])
        );
        assert_eq!(graph.edge_count, 2);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.degree(3), 0);
    }

    #[test]
    fn adjacency_is_sorted_for_lookup() {
        let mut builder = GraphBuilder::with_capacity(3);
        builder.add_edge("x", "z");
        builder.add_edge("x", "y");
        builder.add_edge("x", "x");
        let graph = builder.build();
        assert_eq!(graph.neighbors(0), &[0, 1, 2]);
        assert!(graph.has_edge(0, 1));
        assert!(!graph.has_edge(1, 2));
        assert_eq!(graph.edge_count, 3);
    }
}
