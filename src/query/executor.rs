//! Generic Join executor.
//!
//! Prefixes are seeded from an edge enumeration and extended one slot per
//! stage. Each extension is driven by the smallest candidate list of the
//! stage and narrowed by intersecting with the remaining lists in rule
//! order. Extended prefixes are handed to the next stage in fixed-size
//! batches.

use std::mem;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;

use super::rule::{IntersectionRule, Plan};
use super::sink::OutputSink;
use crate::storage::{EdgeFilter, SortedAdjacencyList, VersionedGraph};
use crate::types::{Direction, Edge, GraphVersion, Result, Tuple, VertexId};

/// Default number of prefixes handed to the next stage at once.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Tuning knobs for [`GenericJoinExecutor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinOptions {
    /// Prefixes handed to the next stage per dispatch.
    pub batch_size: usize,
}

impl JoinOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size; zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Work counters for one execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Edges read from the seed enumeration.
    pub seeds_scanned: u64,
    /// Prefixes handed to a non-seed stage.
    pub prefixes_extended: u64,
    /// Sorted-list intersections performed.
    pub intersections: u64,
    /// Completed tuples pushed to the sink.
    pub tuples_emitted: u64,
}

impl JoinStats {
    /// Adds the counters of `other` to `self`.
    pub fn absorb(&mut self, other: JoinStats) {
        self.seeds_scanned += other.seeds_scanned;
        self.prefixes_extended += other.prefixes_extended;
        self.intersections += other.intersections;
        self.tuples_emitted += other.tuples_emitted;
    }
}

/// Runs a [`Plan`] against a [`VersionedGraph`], pushing matches to a sink.
///
/// Stage 0 enumerates the edges of its first rule; the remaining stage-0
/// rules are checked by direct lookup. Stage `s` then binds prefix slot
/// `s + 1`. Tuples are emitted in prefix-slot order.
///
/// Relations have set semantics over vertex pairs, so each pair seeds at
/// most once however many typed edges connect it. A seed read from a diff
/// version enumerates the pairs whose membership in the rule's relation
/// changed: an added edge between a pair that was already connected (with a
/// matching type) is skipped, and so is a deleted edge whose pair stays
/// connected.
pub struct GenericJoinExecutor<'a, S> {
    plan: &'a Plan,
    graph: &'a VersionedGraph,
    sink: S,
    options: JoinOptions,
    stats: JoinStats,
}

impl<'a, S: OutputSink> GenericJoinExecutor<'a, S> {
    /// Creates an executor pushing matches of `plan` over `graph` into `sink`.
    pub fn new(plan: &'a Plan, graph: &'a VersionedGraph, sink: S) -> Self {
        Self {
            plan,
            graph,
            sink,
            options: JoinOptions::default(),
            stats: JoinStats::default(),
        }
    }

    /// Overrides the default [`JoinOptions`].
    pub fn with_options(mut self, options: JoinOptions) -> Self {
        self.options = options;
        self
    }

    /// The sink, for inspection after [`GenericJoinExecutor::execute`].
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the executor and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the plan to completion.
    ///
    /// The plan is validated first; an invalid plan fails without reading
    /// the graph. Returns the counters of this run.
    pub fn execute(&mut self) -> Result<JoinStats> {
        self.plan.validate()?;
        self.stats = JoinStats::default();
        let (plan, graph) = (self.plan, self.graph);
        let stage = &plan.stages[0];
        let seed = stage[0];
        let batch_size = self.options.batch_size.max(1);

        let mut seen_pairs = FxHashSet::default();
        let mut last_pair = None;
        let mut batch = Vec::with_capacity(batch_size);
        for edge in graph.edges(seed.version, seed.direction, EdgeFilter::edge_type(seed.edge_type)) {
            self.stats.seeds_scanned += 1;
            if seed.version.is_indexable() {
                // Typed edges of one pair are adjacent in list order.
                if last_pair.replace((edge.from, edge.to)) == Some((edge.from, edge.to)) {
                    continue;
                }
            } else if !self.changed_pair(&seed, edge, &mut seen_pairs)? {
                continue;
            }
            let prefix: Tuple = match seed.direction {
                Direction::Forward => vec![edge.from, edge.to],
                Direction::Backward => vec![edge.to, edge.from],
            };
            if !self.satisfies(&stage[1..], &prefix)? {
                continue;
            }
            batch.push(prefix);
            if batch.len() == batch_size {
                let full = mem::replace(&mut batch, Vec::with_capacity(batch_size));
                self.dispatch(1, full)?;
            }
        }
        if !batch.is_empty() {
            self.dispatch(1, batch)?;
        }

        debug!(
            stages = self.plan.stages.len(),
            seeds = self.stats.seeds_scanned,
            extended = self.stats.prefixes_extended,
            intersections = self.stats.intersections,
            emitted = self.stats.tuples_emitted,
            "join.execute"
        );
        Ok(self.stats)
    }

    /// Whether a diff-log edge changes the relation of `seed` at its pair.
    fn changed_pair(
        &self,
        seed: &IntersectionRule,
        edge: Edge,
        seen: &mut FxHashSet<(VertexId, VertexId)>,
    ) -> Result<bool> {
        if !seen.insert((edge.from, edge.to)) {
            return Ok(false);
        }
        let other = match seed.version {
            GraphVersion::DiffPlus => GraphVersion::Permanent,
            _ => GraphVersion::Merged,
        };
        let list = self.graph.adjacency_list(edge.from, Direction::Forward, other)?;
        Ok(!list.contains(edge.to, seed.edge_type))
    }

    /// Checks the non-seed rules of stage 0 against a 2-slot prefix.
    fn satisfies(&self, rules: &[IntersectionRule], prefix: &[VertexId]) -> Result<bool> {
        for rule in rules {
            let list =
                self.graph
                    .adjacency_list(prefix[rule.prefix_slot], rule.direction, rule.version)?;
            if !list.contains(prefix[1], rule.edge_type) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn dispatch(&mut self, stage_idx: usize, prefixes: Vec<Tuple>) -> Result<()> {
        if stage_idx == self.plan.stages.len() {
            self.stats.tuples_emitted += prefixes.len() as u64;
            self.sink.append(prefixes)
        } else {
            self.extend(stage_idx, prefixes)
        }
    }

    fn extend(&mut self, stage_idx: usize, prefixes: Vec<Tuple>) -> Result<()> {
        let (plan, graph) = (self.plan, self.graph);
        let stage = &plan.stages[stage_idx];
        let batch_size = self.options.batch_size.max(1);
        let mut out = Vec::with_capacity(batch_size);

        for prefix in &prefixes {
            self.stats.prefixes_extended += 1;
            let mut lists: SmallVec<[&SortedAdjacencyList; 4]> = SmallVec::new();
            for rule in stage {
                lists.push(graph.adjacency_list(
                    prefix[rule.prefix_slot],
                    rule.direction,
                    rule.version,
                )?);
            }
            let driver = lists
                .iter()
                .enumerate()
                .min_by_key(|(_, list)| list.len())
                .map_or(0, |(idx, _)| idx);

            let mut extensions = lists[driver].filtered_neighbour_ids(stage[driver].edge_type);
            for (idx, (rule, list)) in stage.iter().zip(&lists).enumerate() {
                if extensions.is_empty() {
                    break;
                }
                if idx == driver {
                    continue;
                }
                extensions = list.intersection(&extensions, rule.edge_type);
                self.stats.intersections += 1;
            }

            for value in extensions {
                let mut next = Vec::with_capacity(prefix.len() + 1);
                next.extend_from_slice(prefix);
                next.push(value);
                out.push(next);
                if out.len() == batch_size {
                    let full = mem::replace(&mut out, Vec::with_capacity(batch_size));
                    self.dispatch(stage_idx + 1, full)?;
                }
            }
        }
        if !out.is_empty() {
            self.dispatch(stage_idx + 1, out)?;
        }
        Ok(())
    }
}
