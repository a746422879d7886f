use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::GraphVersion;

/// Trait for tracking storage operations on a [`super::VersionedGraph`].
///
/// Implementations receive one callback per effective temporary edit, per
/// commit, and per adjacency lookup issued by the join engine.
pub trait StorageMetrics: Send + Sync {
    /// Records a temporary edge addition that changed the merged view.
    fn edge_added(&self);

    /// Records a temporary edge deletion that changed the merged view.
    fn edge_deleted(&self);

    /// Records a commit that folded `touched_vertices` overlay entries.
    fn commit(&self, touched_vertices: usize);

    /// Records an adjacency list lookup against `version`.
    fn adjacency_lookup(&self, version: GraphVersion);
}

/// A no-op implementation of [`StorageMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl StorageMetrics for NoopMetrics {
    fn edge_added(&self) {}
    fn edge_deleted(&self) {}
    fn commit(&self, _touched_vertices: usize) {}
    fn adjacency_lookup(&self, _version: GraphVersion) {}
}

/// A thread-safe counter-based implementation of [`StorageMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of effective temporary additions.
    pub edges_added: AtomicU64,

    /// Number of effective temporary deletions.
    pub edges_deleted: AtomicU64,

    /// Number of commits that had pending changes.
    pub commits: AtomicU64,

    /// Total overlay entries folded by commits.
    pub vertices_committed: AtomicU64,

    /// Lookups served from the permanent lists.
    pub permanent_lookups: AtomicU64,

    /// Lookups against the merged view.
    pub merged_lookups: AtomicU64,
}

impl StorageMetrics for CounterMetrics {
    fn edge_added(&self) {
        self.edges_added.fetch_add(1, Ordering::Relaxed);
    }

    fn edge_deleted(&self) {
        self.edges_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn commit(&self, touched_vertices: usize) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.vertices_committed
            .fetch_add(touched_vertices as u64, Ordering::Relaxed);
    }

    fn adjacency_lookup(&self, version: GraphVersion) {
        match version {
            GraphVersion::Permanent => {
                self.permanent_lookups.fetch_add(1, Ordering::Relaxed);
            }
            GraphVersion::Merged => {
                self.merged_lookups.fetch_add(1, Ordering::Relaxed);
            }
            GraphVersion::DiffPlus | GraphVersion::DiffMinus => {}
        }
    }
}

/// Returns the default metrics sink, which discards everything.
pub fn default_metrics() -> Arc<dyn StorageMetrics> {
    Arc::new(NoopMetrics)
}
