//! Cooperative cancellation and progress reporting for long clustering runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag the merge loop polls at every progress checkpoint.
///
/// Clones share the flag, so a token can be handed to another thread (or to
/// the progress callback itself) and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Merges performed so far
    pub merges: usize,
    /// Clusters still alive
    pub live_clusters: usize,
    /// Whether cancellation has been requested
    pub cancellation_requested: bool,
    /// Human-readable status line
    pub message: String,
}

impl ProgressUpdate {
    pub(crate) fn new(merges: usize, live_clusters: usize, cancellation_requested: bool) -> Self {
        Self {
            merges,
            live_clusters,
            cancellation_requested,
            message: format!(
                "Merging clusters: {} merges performed, {} clusters remaining",
                merges, live_clusters
            ),
        }
    }
}
