//! CONTINUOUS MATCH registry.
//!
//! Registered queries receive the matches that emerge or disappear each
//! time a pending edit batch is applied to the graph.

use std::fmt;

use tracing::{debug, info, warn};

use super::builder::QueryGraph;
use super::delta::{deliver, DeltaGenericJoinExecutor};
use super::executor::JoinOptions;
use super::sink::{DeltaMatches, DeltaSink, MatchChange};
use crate::storage::{CommitStats, VersionedGraph};
use crate::types::Result;

/// Handle returned by [`ContinuousMatches::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuousQueryId(pub u64);

impl fmt::Display for ContinuousQueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

struct Registration {
    id: ContinuousQueryId,
    name: String,
    query: QueryGraph,
    sink: Box<dyn DeltaSink>,
}

/// Outcome of one [`ContinuousMatches::apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Registered queries whose delta was computed.
    pub queries: usize,
    /// Matches that appeared, summed over queries.
    pub emerged: usize,
    /// Matches that disappeared, summed over queries.
    pub deleted: usize,
    /// Summary of the commit that closed the batch.
    pub commit: CommitStats,
}

/// Set of standing queries maintained across commits.
#[derive(Default)]
pub struct ContinuousMatches {
    next_id: u64,
    registrations: Vec<Registration>,
    options: JoinOptions,
}

impl ContinuousMatches {
    /// Creates an empty registry whose deltas run with `options`.
    pub fn new(options: JoinOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Registers `query`; its changes are pushed to `sink` on every apply.
    ///
    /// The query is validated up front so `apply` cannot fail on its shape.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        query: QueryGraph,
        sink: Box<dyn DeltaSink>,
    ) -> Result<ContinuousQueryId> {
        query.validate()?;
        let id = ContinuousQueryId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        info!(id = %id, name = %name, edges = query.edges().len(), "continuous.register");
        self.registrations.push(Registration {
            id,
            name,
            query,
            sink,
        });
        Ok(id)
    }

    /// Removes a query. Returns `false` if `id` was not registered.
    pub fn deregister(&mut self, id: ContinuousQueryId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|reg| reg.id != id);
        let removed = self.registrations.len() != before;
        if removed {
            info!(id = %id, "continuous.deregister");
        }
        removed
    }

    /// Number of registered queries.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` when no query is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Names of the registered queries, in registration order.
    pub fn names(&self) -> impl Iterator<Item = (ContinuousQueryId, &str)> + '_ {
        self.registrations
            .iter()
            .map(|reg| (reg.id, reg.name.as_str()))
    }

    /// Computes the delta of every registered query, commits `graph`, then
    /// delivers each delta to its sink.
    ///
    /// If any delta fails to compute, nothing is delivered and the graph is
    /// left uncommitted with its pending batch intact, so `apply` can simply
    /// be retried. Sink failures happen after the commit: every other sink
    /// still receives its changes and the first sink error is returned.
    /// Retrying then finds nothing pending, so no sink sees a change twice;
    /// a failing sink has missed the changes it rejected.
    pub fn apply(&mut self, graph: &mut VersionedGraph) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let mut deltas: Vec<DeltaMatches> = Vec::new();
        if graph.has_pending_changes() {
            let view: &VersionedGraph = graph;
            deltas.reserve(self.registrations.len());
            for reg in &self.registrations {
                let mut delta = DeltaMatches::default();
                let stats = DeltaGenericJoinExecutor::new(&reg.query, view)
                    .with_options(self.options)
                    .execute(&mut delta)?;
                debug!(
                    id = %reg.id,
                    name = %reg.name,
                    emerged = stats.emerged,
                    deleted = stats.deleted,
                    "continuous.delta"
                );
                report.queries += 1;
                report.emerged += stats.emerged;
                report.deleted += stats.deleted;
                deltas.push(delta);
            }
        }
        report.commit = graph.finalize_changes();

        let mut first_error = None;
        for (reg, delta) in self.registrations.iter_mut().zip(deltas) {
            let batch_size = self.options.batch_size;
            let delivered = deliver(&mut reg.sink, MatchChange::Emerged, delta.emerged, batch_size)
                .and_then(|()| {
                    deliver(&mut reg.sink, MatchChange::Deleted, delta.deleted, batch_size)
                });
            if let Err(err) = delivered {
                warn!(id = %reg.id, name = %reg.name, error = %err, "continuous.sink_failed");
                first_error.get_or_insert(err);
            }
        }
        info!(
            queries = report.queries,
            emerged = report.emerged,
            deleted = report.deleted,
            "continuous.apply"
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

impl fmt::Debug for ContinuousMatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuousMatches")
            .field("queries", &self.registrations.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::types::{GraphError, GraphVersion, Tuple, VertexId};

    fn shared() -> Arc<Mutex<DeltaMatches>> {
        Arc::new(Mutex::new(DeltaMatches::default()))
    }

    #[test]
    fn apply_delivers_deltas_and_commits() {
        let mut graph = VersionedGraph::default();
        let mut registry = ContinuousMatches::default();
        let triangles = shared();
        let edges = shared();
        let query = QueryGraph::new().edge("a", "b").edge("b", "c").edge("c", "a");
        registry
            .register("triangles", query, Box::new(triangles.clone()))
            .unwrap();
        let pairs = QueryGraph::new().edge("x", "y");
        let pairs_id = registry.register("pairs", pairs, Box::new(edges.clone())).unwrap();
        assert_eq!(registry.len(), 2);

        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            graph.add_edge_temporarily(VertexId(a), VertexId(b)).unwrap();
        }
        let report = registry.apply(&mut graph).unwrap();
        assert_eq!(report.queries, 2);
        assert_eq!(report.emerged, 6);
        assert_eq!(report.commit.edges_added, 3);
        assert!(!graph.has_pending_changes());
        assert_eq!(triangles.lock().emerged.len(), 3);
        assert_eq!(edges.lock().emerged.len(), 3);

        assert!(registry.deregister(pairs_id));
        assert!(!registry.deregister(pairs_id));
        triangles.lock().clear();
        graph.delete_edge_temporarily(VertexId(2), VertexId(0)).unwrap();
        let report = registry.apply(&mut graph).unwrap();
        assert_eq!(report.queries, 1);
        assert_eq!(triangles.lock().deleted.len(), 3);
        assert!(graph
            .diff(GraphVersion::DiffMinus)
            .unwrap()
            .is_empty());
    }

    /// Rejects its first batch, accepts everything after.
    struct FlakySink {
        failed: bool,
    }

    impl DeltaSink for FlakySink {
        fn append(&mut self, _change: MatchChange, _batch: Vec<Tuple>) -> Result<()> {
            if self.failed {
                return Ok(());
            }
            self.failed = true;
            Err(GraphError::InvalidArgument("sink unavailable".into()))
        }
    }

    #[test]
    fn retry_after_sink_failure_delivers_once() {
        let mut graph = VersionedGraph::default();
        let mut registry = ContinuousMatches::default();
        let collected = shared();
        registry
            .register("a", QueryGraph::new().edge("x", "y"), Box::new(collected.clone()))
            .unwrap();
        registry
            .register(
                "b",
                QueryGraph::new().edge("x", "y"),
                Box::new(FlakySink { failed: false }),
            )
            .unwrap();

        graph.add_edge_temporarily(VertexId(0), VertexId(1)).unwrap();
        let err = registry.apply(&mut graph).unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
        assert!(!graph.has_pending_changes());

        let report = registry.apply(&mut graph).unwrap();
        assert_eq!(report.queries, 0);
        let expected: Vec<Tuple> = vec![vec![VertexId(0), VertexId(1)]];
        assert_eq!(collected.lock().emerged, expected);
        assert!(collected.lock().deleted.is_empty());
    }

    #[test]
    fn sinks_registered_after_a_failing_one_still_receive() {
        let mut graph = VersionedGraph::default();
        let mut registry = ContinuousMatches::default();
        let collected = shared();
        registry
            .register(
                "flaky",
                QueryGraph::new().edge("x", "y"),
                Box::new(FlakySink { failed: false }),
            )
            .unwrap();
        registry
            .register("pairs", QueryGraph::new().edge("x", "y"), Box::new(collected.clone()))
            .unwrap();

        graph.add_edge_temporarily(VertexId(2), VertexId(3)).unwrap();
        assert!(registry.apply(&mut graph).is_err());
        assert_eq!(collected.lock().emerged.len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn invalid_queries_are_refused() {
        let mut registry = ContinuousMatches::default();
        let err = registry
            .register("empty", QueryGraph::new(), Box::new(DeltaMatches::default()))
            .unwrap_err();
        assert_eq!(err.code(), "EmptyQuery");
        assert!(registry.is_empty());
    }

    #[test]
    fn apply_without_edits_is_quiet() {
        let mut graph = VersionedGraph::default();
        let mut registry = ContinuousMatches::default();
        let sink = shared();
        registry
            .register("pairs", QueryGraph::new().edge("a", "b"), Box::new(sink.clone()))
            .unwrap();
        let report = registry.apply(&mut graph).unwrap();
        assert_eq!(report, ApplyReport::default());
        assert!(sink.lock().is_empty());
        assert_eq!(registry.names().next().map(|(_, n)| n), Some("pairs"));
    }
}
