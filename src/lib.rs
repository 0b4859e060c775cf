//! Agglomerative modularity clustering of undirected graphs

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;
pub mod viz;

pub use cluster::{
    CancellationToken, ClusterId, ClusterOutcome, ClusteringEngine, Group, MergeRecord, Partition,
    ProgressUpdate,
};
pub use config::Config;
pub use error::{ClusterError, Result};
pub use graph::{ClusterGraph, CompressedGraph, GraphBuilder};
