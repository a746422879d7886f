//! Versioned in-memory graph store.
//!
//! Holds the committed adjacency lists, the pending edit batch, and the
//! views the join engine reads from.

mod adjacency;
mod edges;
mod graph;
mod log;
mod metrics;
mod options;
mod snapshot;

/// Sorted per-vertex neighbour list.
pub use adjacency::SortedAdjacencyList;

/// Edge enumeration over one graph version.
pub use edges::{EdgeFilter, EdgeIter};

/// The versioned graph and its commit summary.
pub use graph::{CommitStats, VersionedGraph};

/// Pending edge logs backing the diff versions.
pub use log::{EdgeLog, EdgeLogIter};

/// Metrics hooks.
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, StorageMetrics};

/// Graph configuration options.
pub use options::GraphOptions;

/// Snapshot/restore of the committed graph.
pub use snapshot::GraphSnapshot;
