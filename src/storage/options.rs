use std::fmt;
use std::sync::Arc;

use super::metrics::{default_metrics, StorageMetrics};

/// Configuration options supplied when constructing a [`super::VersionedGraph`].
#[derive(Clone)]
pub struct GraphOptions {
    /// Number of vertex slots reserved up front in the permanent arrays.
    pub initial_vertex_capacity: usize,
    /// Metrics collection implementation.
    pub metrics: Arc<dyn StorageMetrics>,
}

impl GraphOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self {
            initial_vertex_capacity: 0,
            metrics: default_metrics(),
        }
    }

    /// Reserves room for `vertices` permanent vertex slots.
    pub fn initial_vertex_capacity(mut self, vertices: usize) -> Self {
        self.initial_vertex_capacity = vertices;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn StorageMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphOptions")
            .field("initial_vertex_capacity", &self.initial_vertex_capacity)
            .finish_non_exhaustive()
    }
}
