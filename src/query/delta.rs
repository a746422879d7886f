//! Incremental maintenance of MATCH results across one pending edit batch.
//!
//! For a pattern with edges `e_1..e_n`, the change of its result set is the
//! union of `n` terms. Term `i` reads `e_i` from a diff log, every earlier
//! edge from the merged view and every later edge from the permanent view.
//! The terms are evaluated twice, against `DiffPlus` and `DiffMinus`, and
//! their outputs are netted per tuple.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::builder::{OrderedPlan, QueryGraph};
use super::executor::{GenericJoinExecutor, JoinOptions, JoinStats};
use super::sink::{DeltaMatches, DeltaSink, MatchChange, OutputSink};
use crate::storage::VersionedGraph;
use crate::types::{GraphError, GraphVersion, Result, Tuple};

/// Counters for one delta evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeltaStats {
    /// Delta plans actually executed.
    pub plans_run: usize,
    /// Tuples reported as emerged.
    pub emerged: usize,
    /// Tuples reported as deleted.
    pub deleted: usize,
    /// Work summed over every executed plan.
    pub join: JoinStats,
}

/// Computes the matches that appear or disappear when the pending batch of
/// `graph` is committed, without re-running the full join.
pub struct DeltaGenericJoinExecutor<'a> {
    query: &'a QueryGraph,
    graph: &'a VersionedGraph,
    options: JoinOptions,
}

impl<'a> DeltaGenericJoinExecutor<'a> {
    /// Creates an executor for `query` over the pending batch of `graph`.
    pub fn new(query: &'a QueryGraph, graph: &'a VersionedGraph) -> Self {
        Self {
            query,
            graph,
            options: JoinOptions::default(),
        }
    }

    /// Overrides the join options used by every delta plan.
    pub fn with_options(mut self, options: JoinOptions) -> Self {
        self.options = options;
        self
    }

    /// One plan per pattern edge, seeded from `diff` on that edge.
    pub fn delta_plans(&self, diff: GraphVersion) -> Result<Vec<OrderedPlan>> {
        if diff.is_indexable() {
            return Err(GraphError::InvalidArgument(format!(
                "delta plans read a diff log, not {}",
                diff.as_str()
            )));
        }
        let edges = self.query.edges().len();
        let mut plans = Vec::with_capacity(edges);
        for edge in 0..edges {
            let versions: Vec<GraphVersion> = (0..edges)
                .map(|other| match other.cmp(&edge) {
                    std::cmp::Ordering::Less => GraphVersion::Merged,
                    std::cmp::Ordering::Equal => diff,
                    std::cmp::Ordering::Greater => GraphVersion::Permanent,
                })
                .collect();
            let ordering = self.query.ordering_from(edge)?;
            plans.push(self.query.plan(&ordering, &versions, edge)?);
        }
        Ok(plans)
    }

    /// Evaluates every delta plan and pushes the netted changes to `sink`.
    ///
    /// Tuples are in variable declaration order. Each side is emitted
    /// sorted, emerged before deleted, in batches of the configured size.
    pub fn execute<D: DeltaSink + ?Sized>(&self, sink: &mut D) -> Result<DeltaStats> {
        self.query.validate()?;
        let mut stats = DeltaStats::default();
        let mut counts: FxHashMap<Tuple, i64> = FxHashMap::default();

        for (diff, sign) in [(GraphVersion::DiffPlus, 1), (GraphVersion::DiffMinus, -1)] {
            if self.graph.diff(diff)?.is_empty() {
                continue;
            }
            for ordered in self.delta_plans(diff)? {
                let counter = SignedCounter {
                    counts: &mut counts,
                    ordered: &ordered,
                    sign,
                };
                let run = GenericJoinExecutor::new(&ordered.plan, self.graph, counter)
                    .with_options(self.options)
                    .execute()?;
                stats.join.absorb(run);
                stats.plans_run += 1;
            }
        }

        let mut emerged = Vec::new();
        let mut deleted = Vec::new();
        for (tuple, count) in counts {
            match count.signum() {
                1 => emerged.push(tuple),
                -1 => deleted.push(tuple),
                _ => {}
            }
        }
        stats.emerged = emerged.len();
        stats.deleted = deleted.len();
        let batch_size = self.options.batch_size;
        deliver(sink, MatchChange::Emerged, emerged, batch_size)?;
        deliver(sink, MatchChange::Deleted, deleted, batch_size)?;

        debug!(
            query_edges = self.query.edges().len(),
            plans = stats.plans_run,
            emerged = stats.emerged,
            deleted = stats.deleted,
            "delta.execute"
        );
        Ok(stats)
    }

    /// Convenience wrapper collecting the changes in memory.
    pub fn execute_collect(&self) -> Result<DeltaMatches> {
        let mut matches = DeltaMatches::default();
        self.execute(&mut matches)?;
        Ok(matches)
    }
}

/// Sorts `tuples` and pushes them to `sink` in chunks of `batch_size`.
pub(crate) fn deliver<D: DeltaSink + ?Sized>(
    sink: &mut D,
    change: MatchChange,
    mut tuples: Vec<Tuple>,
    batch_size: usize,
) -> Result<()> {
    tuples.sort_unstable();
    for chunk in tuples.chunks(batch_size.max(1)) {
        sink.append(change, chunk.to_vec())?;
    }
    Ok(())
}

/// Accumulates signed match counts in declaration order.
struct SignedCounter<'c> {
    counts: &'c mut FxHashMap<Tuple, i64>,
    ordered: &'c OrderedPlan,
    sign: i64,
}

impl OutputSink for SignedCounter<'_> {
    fn append(&mut self, batch: Vec<Tuple>) -> Result<()> {
        for tuple in batch {
            let tuple = self.ordered.to_declaration_order(&tuple);
            *self.counts.entry(tuple).or_insert(0) += self.sign;
        }
        Ok(())
    }
}
