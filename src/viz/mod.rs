//! Visualization export module

use anyhow::Result;
use itertools::Itertools;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cluster::metrics::GroupStats;
use crate::cluster::Partition;
use crate::graph::CompressedGraph;

/// Generate visualization inputs from clustering results
pub fn generate_visualizations(
    partition: &Partition,
    stats: &[GroupStats],
    graph: &CompressedGraph,
    output_dir: &str,
) -> Result<()> {
    log::info!("Generating visualizations for {} groups", partition.len());

    let viz_dir = Path::new(output_dir).join("visualizations");
    fs::create_dir_all(&viz_dir)?;

    generate_graphml(partition, graph, &viz_dir)?;
    generate_stats_csv(partition, stats, &viz_dir)?;

    log::info!("Visualizations generated successfully");

    Ok(())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write the whole graph as GraphML with group, color and shape per node
fn generate_graphml(partition: &Partition, graph: &CompressedGraph, viz_dir: &Path) -> Result<()> {
    log::info!("Generating GraphML network file");

    let file_path = viz_dir.join("network.graphml");
    let mut file = BufWriter::new(File::create(file_path)?);

    writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(file, "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">")?;
    writeln!(file, "  <key id=\"label\" for=\"node\" attr.name=\"label\" attr.type=\"string\"/>")?;
    writeln!(file, "  <key id=\"group\" for=\"node\" attr.name=\"group\" attr.type=\"int\"/>")?;
    writeln!(file, "  <key id=\"color\" for=\"node\" attr.name=\"color\" attr.type=\"string\"/>")?;
    writeln!(file, "  <key id=\"shape\" for=\"node\" attr.name=\"shape\" attr.type=\"string\"/>")?;
    writeln!(file, "  <graph id=\"G\" edgedefault=\"undirected\">")?;

    for vertex in 0..graph.node_count {
        let group = partition.group_of(vertex);
        writeln!(
            file,
            "    <node id=\"n{}\">\n      <data key=\"label\">{}</data>\n      <data key=\"group\">{}</data>\n      <data key=\"color\">{}</data>\n      <data key=\"shape\">{}</data>\n    </node>",
            vertex,
            escape_xml(&graph.label(vertex)),
            group.index,
            group.appearance.color.to_hex(),
            group.appearance.shape.name()
        )?;
    }

    // Each undirected edge is stored twice; write it from its lower endpoint
    let mut edge_id = 0;
    for src in 0..graph.node_count {
        for &dst in graph.neighbors(src) {
            if (dst as usize) < src {
                continue;
            }
            writeln!(
                file,
                "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\"/>",
                edge_id, src, dst
            )?;
            edge_id += 1;
        }
    }

    writeln!(file, "  </graph>")?;
    writeln!(file, "</graphml>")?;
    file.flush()?;

    Ok(())
}

/// Write one CSV row per group for external charting
fn generate_stats_csv(partition: &Partition, stats: &[GroupStats], viz_dir: &Path) -> Result<()> {
    log::info!("Generating group statistics CSV");

    let stats_path = viz_dir.join("group_stats.csv");
    let mut stats_file = File::create(stats_path)?;

    writeln!(stats_file, "group,size,degree,density,color,shape,central_nodes")?;

    for (group, stat) in partition.groups.iter().zip(stats) {
        writeln!(
            stats_file,
            "{},{},{},{:.6},{},{},{}",
            group.index,
            stat.size,
            stat.degree,
            stat.density,
            group.appearance.color.to_hex(),
            group.appearance.shape.name(),
            stat.central_nodes.iter().join(" ")
        )?;
    }

    Ok(())
}
