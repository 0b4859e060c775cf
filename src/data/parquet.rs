//! Parquet file handling for edge list data

use anyhow::{anyhow, Result};
use polars::prelude::*;

use crate::data::LoadOptions;
use crate::graph::{CompressedGraph, GraphBuilder};

/// Load an undirected edge list from a Parquet file.
///
/// Both endpoint columns are read as strings, so integer and string vertex
/// ids work alike. Rows with a missing endpoint are skipped.
pub fn load_edges(path: &str, options: &LoadOptions) -> Result<CompressedGraph> {
    log::info!("Reading parquet file: {}", path);

    if !std::path::Path::new(path).exists() {
        return Err(anyhow!("File not found: {}", path));
    }

    let df = LazyFrame::scan_parquet(path, Default::default())?
        .select([
            col(options.source_column.as_str()),
            col(options.target_column.as_str()),
        ])
        .collect()?;

    log::info!("File schema: {:?}", df.schema());
    log::info!("Loaded {} edge rows", df.height());

    let source = df
        .column(&options.source_column)?
        .cast(&DataType::String)?;
    let target = df
        .column(&options.target_column)?
        .cast(&DataType::String)?;
    let source = source.str()?;
    let target = target.str()?;

    let mut builder = GraphBuilder::with_capacity(df.height());
    let mut skipped = 0usize;
    for i in 0..df.height() {
        match (source.get(i), target.get(i)) {
            (Some(src), Some(dst)) => builder.add_edge(src, dst),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} rows with a missing endpoint", skipped);
    }

    Ok(builder.build())
}
