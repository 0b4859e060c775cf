//! Loading host graphs from edge list files

pub mod parquet;
pub mod text;

use std::path::Path;

use anyhow::Result;

use crate::graph::CompressedGraph;

/// Where the endpoints live in tabular inputs
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub source_column: String,
    pub target_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            source_column: "Source".to_string(),
            target_column: "Target".to_string(),
        }
    }
}

/// Load an undirected edge list, choosing the reader by file extension
pub fn load_edge_list(path: &str, options: &LoadOptions) -> Result<CompressedGraph> {
    let is_parquet = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("parquet"));

    let graph = if is_parquet {
        parquet::load_edges(path, options)?
    } else {
        text::load_edges(path)?
    };

    log::info!(
        "Loaded graph with {} nodes and {} edges ({} bytes)",
        graph.node_count,
        graph.edge_count,
        graph.memory_usage()
    );
    Ok(graph)
}
