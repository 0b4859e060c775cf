//! Configuration management for the clustering engine

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};

/// Default number of merge cycles between cancellation checks
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Tunables for a clustering run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Merge cycles between cancellation checks and progress reports
    pub progress_interval: usize,

    /// Collect every vertex without neighbors into one shared group
    pub put_neighborless_vertices_in_one_cluster: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            put_neighborless_vertices_in_one_cluster: false,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(progress_interval: usize, put_neighborless_vertices_in_one_cluster: bool) -> Self {
        Self {
            progress_interval,
            put_neighborless_vertices_in_one_cluster,
        }
    }

    /// Reject values the merge loop cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(ClusterError::InvalidConfig(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
