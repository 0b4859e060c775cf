//! Results persistence module

use anyhow::Result;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::cluster::metrics::GroupStats;
use crate::cluster::Partition;
use crate::graph::CompressedGraph;

/// Save clustering results to the specified directory
pub fn save_results(
    partition: &Partition,
    stats: &[GroupStats],
    graph: &CompressedGraph,
    modularity: f64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving {} groups to {}", partition.len(), output_dir);

    fs::create_dir_all(output_dir)?;

    save_summary(partition, graph, modularity, output_dir)?;
    save_partition(partition, graph, output_dir)?;
    save_groups(partition, stats, graph, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save summary information
fn save_summary(
    partition: &Partition,
    graph: &CompressedGraph,
    modularity: f64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let sizes: Vec<usize> = partition.groups.iter().map(|g| g.size()).collect();
    let group_count = sizes.len();

    let summary = json!({
        "graph_stats": {
            "node_count": graph.node_count,
            "edge_count": graph.edge_count,
            "avg_degree": if graph.node_count == 0 { 0.0 } else {
                graph.edges.len() as f64 / graph.node_count as f64
            },
        },
        "cluster_stats": {
            "group_count": group_count,
            "merge_count": partition.merges.len(),
            "modularity": modularity,
            "largest_group_size": sizes.iter().copied().max().unwrap_or(0),
            "smallest_group_size": sizes.iter().copied().min().unwrap_or(0),
            "singleton_count": sizes.iter().filter(|&&size| size == 1).count(),
            "avg_group_size": sizes.iter().sum::<usize>() as f64 /
                              if group_count == 0 { 1.0 } else { group_count as f64 },
        }
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save the vertex → group assignment, plus the merge history
fn save_partition(partition: &Partition, graph: &CompressedGraph, output_dir: &str) -> Result<()> {
    log::info!("Saving vertex assignment");

    let path = Path::new(output_dir).join("partition.json");
    let mut file = File::create(path)?;

    let assignment: Vec<_> = partition
        .assignment
        .iter()
        .enumerate()
        .map(|(vertex, &group)| {
            json!({
                "vertex": graph.label(vertex),
                "group": group,
            })
        })
        .collect();

    let partition_json = json!({
        "assignment": assignment,
        "merges": partition.merges,
    });

    file.write_all(to_string_pretty(&partition_json)?.as_bytes())?;

    Ok(())
}

/// Save per-group information
fn save_groups(
    partition: &Partition,
    stats: &[GroupStats],
    graph: &CompressedGraph,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving group information");

    let path = Path::new(output_dir).join("groups.json");
    let mut file = File::create(path)?;

    let groups: Vec<_> = partition
        .groups
        .iter()
        .zip(stats)
        .map(|(group, stat)| {
            json!({
                "index": group.index,
                "cluster_id": group.cluster_id,
                "size": group.size(),
                "degree": group.degree,
                "density": stat.density,
                "color": group.appearance.color.to_hex(),
                "shape": group.appearance.shape.name(),
                "central_nodes": stat.central_nodes.iter()
                    .map(|&v| graph.label(v))
                    .collect::<Vec<_>>(),
                "members": group.members.iter()
                    .map(|&v| graph.label(v))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    file.write_all(to_string_pretty(&json!({ "groups": groups }))?.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::metrics::{group_stats, modularity};
    use crate::cluster::ClusteringEngine;
    use crate::graph::GraphBuilder;

    #[test]
    fn writes_all_result_files() {
        let mut builder = GraphBuilder::with_capacity(4);
        builder.add_edge("alice", "bob");
        builder.add_edge("carol", "dave");
        let graph = builder.build();

        let partition = ClusteringEngine::default()
            .cluster(&graph)
            .unwrap()
            .into_partition()
            .unwrap();
        let stats = group_stats(&graph, &partition);
        let q = modularity(&graph, &partition.assignment);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        save_results(&partition, &stats, &graph, q, out).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["cluster_stats"]["group_count"], 2);
        assert_eq!(summary["graph_stats"]["edge_count"], 2);

        let groups: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("groups.json")).unwrap()).unwrap();
        assert_eq!(groups["groups"][0]["members"], json!(["alice", "bob"]));
        assert_eq!(groups["groups"][0]["color"], "#FF0000");

        let assignment: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("partition.json")).unwrap()).unwrap();
        assert_eq!(assignment["assignment"][3]["vertex"], "dave");
        assert_eq!(assignment["assignment"][3]["group"], 1);
        assert_eq!(assignment["merges"].as_array().map(Vec::len), Some(2));
    }
}
