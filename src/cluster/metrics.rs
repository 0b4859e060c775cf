//! Partition quality and per-group statistics

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{Group, Partition};
use crate::graph::{ClusterGraph, CompressedGraph};

/// Groups at least this large are measured in parallel
const PARALLEL_GROUP_SIZE: usize = 1000;

/// Number of central vertices reported per group
const CENTRAL_NODE_COUNT: usize = 5;

/// Summary statistics of one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStats {
    pub index: usize,
    pub size: usize,
    pub degree: usize,
    /// Internal edges / possible undirected edges
    pub density: f32,
    /// Vertices with the highest intra-group degree, highest first
    pub central_nodes: Vec<usize>,
}

/// Modularity of an arbitrary vertex → community assignment.
///
/// Every adjacency entry is one half-edge; with `T` half-edges in total,
/// `Q = Σ_c (e_c / T − (d_c / T)²)` where `e_c` counts half-edges inside
/// community `c` and `d_c` all half-edges leaving its vertices.
pub fn modularity<G: ClusterGraph>(graph: &G, assignment: &[usize]) -> f64 {
    let mut per_community: HashMap<usize, (usize, usize)> = HashMap::new();
    let mut total = 0usize;

    for vertex in 0..graph.vertex_count() {
        let community = assignment[vertex];
        let mut internal = 0;
        let mut degree = 0;
        for neighbor in graph.adjacent(vertex) {
            total += 1;
            degree += 1;
            if assignment[neighbor] == community {
                internal += 1;
            }
        }
        let entry = per_community.entry(community).or_insert((0, 0));
        entry.0 += internal;
        entry.1 += degree;
    }

    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    per_community
        .values()
        .map(|&(internal, degree)| internal as f64 / total - (degree as f64 / total).powi(2))
        .sum()
}

/// Statistics for every group of a partition
pub fn group_stats(graph: &CompressedGraph, partition: &Partition) -> Vec<GroupStats> {
    partition
        .groups
        .iter()
        .map(|group| GroupStats {
            index: group.index,
            size: group.size(),
            degree: group.degree,
            density: calculate_density(graph, group),
            central_nodes: identify_central_nodes(graph, group),
        })
        .collect()
}

/// Calculate density (internal undirected edges / potential edges)
pub fn calculate_density(graph: &CompressedGraph, group: &Group) -> f32 {
    let n = group.size();
    if n <= 1 {
        return 1.0; // By convention, singleton groups have density 1
    }

    let potential_edges = n * (n - 1) / 2;
    let members: HashSet<usize> = group.members.iter().copied().collect();
    let count_internal = |&vertex: &usize| {
        graph
            .neighbors(vertex)
            .iter()
            .filter(|&&other| other as usize != vertex && members.contains(&(other as usize)))
            .count()
    };

    // Each internal edge is seen from both endpoints
    let half_edges: usize = if n < PARALLEL_GROUP_SIZE {
        group.members.iter().map(count_internal).sum()
    } else {
        group.members.par_iter().map(count_internal).sum()
    };

    (half_edges / 2) as f32 / potential_edges as f32
}

/// Vertices with the highest intra-group degree, ties broken by vertex index
pub fn identify_central_nodes(graph: &CompressedGraph, group: &Group) -> Vec<usize> {
    let members: HashSet<usize> = group.members.iter().copied().collect();
    let intra_degree = |&vertex: &usize| {
        let degree = graph
            .neighbors(vertex)
            .iter()
            .filter(|&&other| other as usize != vertex && members.contains(&(other as usize)))
            .count();
        (vertex, degree)
    };

    let mut degrees: Vec<(usize, usize)> = if group.size() < PARALLEL_GROUP_SIZE {
        group.members.iter().map(intra_degree).collect()
    } else {
        group.members.par_iter().map(intra_degree).collect()
    };

    degrees.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    degrees
        .into_iter()
        .take(CENTRAL_NODE_COUNT)
        .map(|(vertex, _)| vertex)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusteringEngine;

    fn two_triangles() -> CompressedGraph {
        let mut graph = CompressedGraph::from_edges(
            6,
            &[(0, 1), (1, 2), (2, 0), (3, 1), (3, 4), (4, 5), (5, 3)],
        );
        graph.sort_adjacency_lists();
        graph
    }

    #[test]
    fn modularity_of_two_triangles() {
        let graph = two_triangles();
        let q = modularity(&graph, &[0, 0, 0, 1, 1, 1]);
        assert!((q - 0.357_142_857_142_857_1).abs() < 1e-12);
    }

    #[test]
    fn one_community_has_zero_modularity() {
        let graph = two_triangles();
        assert!(modularity(&graph, &[0; 6]).abs() < 1e-12);
    }

    #[test]
    fn edgeless_graph_has_zero_modularity() {
        let graph = CompressedGraph::from_edges(3, &[]);
        assert_eq!(modularity(&graph, &[0, 1, 2]), 0.0);
    }

    #[test]
    fn engine_partition_beats_singletons() {
        let graph = two_triangles();
        let partition = ClusteringEngine::default()
            .cluster(&graph)
            .unwrap()
            .into_partition()
            .unwrap();
        let singletons: Vec<usize> = (0..6).collect();
        assert!(modularity(&graph, &partition.assignment) > modularity(&graph, &singletons));
    }

    #[test]
    fn stats_of_triangle_groups() {
        let graph = two_triangles();
        let partition = ClusteringEngine::default()
            .cluster(&graph)
            .unwrap()
            .into_partition()
            .unwrap();
        let stats = group_stats(&graph, &partition);
        assert_eq!(stats.len(), 2);
        for s in &stats {
            assert_eq!(s.size, 3);
            assert_eq!(s.density, 1.0);
            assert_eq!(s.central_nodes.len(), 3);
        }
        // Vertex 1 is the bridge endpoint in the first triangle, but all
        // three members have intra-group degree 2.
        assert_eq!(stats[0].central_nodes, vec![0, 1, 2]);
    }

    #[test]
    fn density_of_a_path() {
        let mut graph = CompressedGraph::from_edges(3, &[(0, 1), (1, 2)]);
        graph.sort_adjacency_lists();
        let group = Group {
            index: 0,
            cluster_id: crate::cluster::ClusterId::new(0),
            members: vec![0, 1, 2],
            degree: 4,
            appearance: crate::cluster::appearance(0, 1),
        };
        assert!((calculate_density(&graph, &group) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(identify_central_nodes(&graph, &group)[0], 1);
    }
}
