//! Plain-text edge lists

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use anyhow::{Context, Result};

use crate::graph::{CompressedGraph, GraphBuilder};

/// Load an edge list with one `source target` pair per line.
///
/// Fields may be separated by whitespace, commas, or tabs. Blank lines and
/// lines starting with `#` or `%` are ignored. A line with a single field
/// registers an isolated vertex. Extra fields (weights) are ignored.
pub fn load_edges(path: &str) -> Result<CompressedGraph> {
    log::info!("Reading edge list: {}", path);
    let file = File::open(path).with_context(|| format!("File not found: {}", path))?;
    read_edges(file)
}

/// Parse an edge list from any reader
pub fn read_edges<R: Read>(reader: R) -> Result<CompressedGraph> {
    let mut builder = GraphBuilder::with_capacity(1024);

    for (line_number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_number + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }

        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty());
        match (fields.next(), fields.next()) {
            (Some(src), Some(dst)) => builder.add_edge(src, dst),
            (Some(vertex), None) => {
                builder.add_vertex(vertex);
            }
            _ => log::warn!("Skipping malformed line {}: {:?}", line_number + 1, line),
        }
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_mixed_separators_and_comments() {
        let input = "# comment\n% another\na b\nb,c\n\nc\ta 1.5\nd\n";
        let graph = read_edges(input.as_bytes()).unwrap();
        assert_eq!(graph.node_count, 4);
        assert_eq!(graph.edge_count, 3);
        assert_eq!(graph.label(3), "d");
        assert_eq!(graph.degree(3), 0);
        assert_eq!(graph.neighbors(0), &[1, 2]);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "1 2").unwrap();
        writeln!(file, "2 2").unwrap();
        drop(file);

        let graph = load_edges(path.to_str().unwrap()).unwrap();
        assert_eq!(graph.edge_count, 2);
        assert_eq!(graph.neighbors(1), &[0, 1]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_edges("/definitely/not/here.txt").is_err());
    }
}
