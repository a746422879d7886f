use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::adjacency::SortedAdjacencyList;
use super::edges::{EdgeFilter, EdgeIter};
use super::log::EdgeLog;
use super::metrics::StorageMetrics;
use super::options::GraphOptions;
use crate::types::{
    Direction, Edge, EdgeType, GraphError, GraphVersion, Result, VertexId, VertexType,
};

pub(crate) static EMPTY_LIST: SortedAdjacencyList = SortedAdjacencyList::new();

type Overlay = FxHashMap<VertexId, SortedAdjacencyList>;

/// Summary of one [`VersionedGraph::finalize_changes`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Overlay lists (forward and backward) folded into the permanent arrays.
    pub lists_replaced: usize,
    /// Edges that were pending addition.
    pub edges_added: usize,
    /// Edges that were pending deletion.
    pub edges_deleted: usize,
}

impl CommitStats {
    /// Returns `true` when the commit had nothing to fold.
    pub fn is_noop(&self) -> bool {
        *self == CommitStats::default()
    }
}

/// Adjacency-list graph with a committed state and a pending edit batch.
///
/// Four views share one vertex id space:
/// - `Permanent`: the per-vertex forward/backward lists, last committed state.
/// - `DiffPlus` / `DiffMinus`: logs of edges added/removed since the commit.
/// - `Merged`: sparse overlay of lists for vertices touched by a pending
///   edit. A vertex missing from the overlay reads as its permanent list.
///
/// Temporary edits never write to the permanent arrays; only
/// [`VersionedGraph::finalize_changes`] does. The diff logs are kept as exact
/// set differences between the merged and permanent views: re-adding an edge
/// that is pending deletion cancels the deletion rather than logging an add.
pub struct VersionedGraph {
    forward: Vec<SortedAdjacencyList>,
    backward: Vec<SortedAdjacencyList>,
    vertex_types: Vec<VertexType>,
    diff_plus: EdgeLog,
    diff_minus: EdgeLog,
    merged_forward: Overlay,
    merged_backward: Overlay,
    // One past the highest permanent vertex id; always `forward.len()`.
    permanent_len: usize,
    // One past the highest id in the merged view, `>= permanent_len`.
    merged_len: usize,
    metrics: Arc<dyn StorageMetrics>,
}

impl VersionedGraph {
    /// Creates an empty graph.
    pub fn new(options: GraphOptions) -> Self {
        Self {
            forward: Vec::with_capacity(options.initial_vertex_capacity),
            backward: Vec::with_capacity(options.initial_vertex_capacity),
            vertex_types: Vec::new(),
            diff_plus: EdgeLog::new(),
            diff_minus: EdgeLog::new(),
            merged_forward: Overlay::default(),
            merged_backward: Overlay::default(),
            permanent_len: 0,
            merged_len: 0,
            metrics: options.metrics,
        }
    }

    /// Bulk-loads `edges` as temporary additions followed by one commit.
    ///
    /// Every endpoint must be below `vertex_count`; the permanent arrays are
    /// sized to `vertex_count` even when trailing vertices have no edges.
    /// A `vertex_count` beyond the `u32` id space is rejected.
    pub fn from_edges<I>(vertex_count: usize, edges: I, options: GraphOptions) -> Result<Self>
    where
        I: IntoIterator<Item = Edge>,
    {
        let highest = match vertex_count.checked_sub(1) {
            Some(h) => Some(VertexId(u32::try_from(h).map_err(|_| {
                GraphError::InvalidArgument(format!(
                    "vertex count {vertex_count} exceeds the 32-bit vertex id space"
                ))
            })?)),
            None => None,
        };
        let mut graph = Self::new(options);
        for edge in edges {
            for vertex in [edge.from, edge.to] {
                if vertex.index() >= vertex_count {
                    return Err(GraphError::VertexOutOfBounds { vertex, highest });
                }
            }
            graph.add_edge_temporarily_typed(edge.from, edge.to, edge.ty)?;
        }
        graph.merged_len = graph.merged_len.max(vertex_count);
        let stats = graph.finalize_changes();
        info!(
            vertices = vertex_count,
            edges = stats.edges_added,
            "graph.bulk_load"
        );
        Ok(graph)
    }

    /// Highest committed vertex id, `None` for an empty graph.
    pub fn highest_permanent_vertex_id(&self) -> Option<VertexId> {
        highest_id(self.permanent_len)
    }

    /// Highest vertex id visible once the pending batch commits.
    pub fn highest_merged_vertex_id(&self) -> Option<VertexId> {
        highest_id(self.merged_len)
    }

    /// Number of vertex slots visible through `version`.
    ///
    /// Diff logs are not indexed by vertex and report the merged bound.
    pub fn vertex_count(&self, version: GraphVersion) -> usize {
        match version {
            GraphVersion::Permanent => self.permanent_len,
            GraphVersion::Merged | GraphVersion::DiffPlus | GraphVersion::DiffMinus => {
                self.merged_len
            }
        }
    }

    /// Number of committed edges.
    pub fn edge_count(&self) -> usize {
        self.forward.iter().map(SortedAdjacencyList::len).sum()
    }

    /// Returns `true` while a temporary edit awaits commit or discard.
    pub fn has_pending_changes(&self) -> bool {
        !self.diff_plus.is_empty()
            || !self.diff_minus.is_empty()
            || !self.merged_forward.is_empty()
            || !self.merged_backward.is_empty()
            || self.merged_len != self.permanent_len
    }

    /// The pending edge log for `DiffPlus` or `DiffMinus`, in edit order.
    pub fn diff(&self, version: GraphVersion) -> Result<&EdgeLog> {
        match version {
            GraphVersion::DiffPlus => Ok(&self.diff_plus),
            GraphVersion::DiffMinus => Ok(&self.diff_minus),
            GraphVersion::Permanent | GraphVersion::Merged => Err(GraphError::Unsupported(
                "only diff versions expose an edge log",
            )),
        }
    }

    /// Type tag of `vertex`, [`VertexType::DEFAULT`] when untagged.
    pub fn vertex_type(&self, vertex: VertexId) -> VertexType {
        self.vertex_types
            .get(vertex.index())
            .copied()
            .unwrap_or_default()
    }

    /// Tags `vertex` with `ty` for the from/to filters of [`VersionedGraph::edges`].
    pub fn set_vertex_type(&mut self, vertex: VertexId, ty: VertexType) -> Result<()> {
        if ty.is_any() {
            return Err(GraphError::InvalidArgument(
                "the wildcard vertex type cannot be assigned".into(),
            ));
        }
        if vertex.index() >= self.vertex_types.len() {
            self.vertex_types
                .resize(vertex.index() + 1, VertexType::DEFAULT);
        }
        self.vertex_types[vertex.index()] = ty;
        Ok(())
    }

    /// Adds `from -> to` with [`EdgeType::DEFAULT`] to the pending batch.
    pub fn add_edge_temporarily(&mut self, from: VertexId, to: VertexId) -> Result<bool> {
        self.add_edge_temporarily_typed(from, to, EdgeType::DEFAULT)
    }

    /// Adds a typed edge to the pending batch.
    ///
    /// Returns `Ok(false)` without touching anything when the edge is already
    /// present in the merged view.
    pub fn add_edge_temporarily_typed(
        &mut self,
        from: VertexId,
        to: VertexId,
        ty: EdgeType,
    ) -> Result<bool> {
        ensure_concrete(ty)?;
        if self.merged_list(from, Direction::Forward).contains(to, ty) {
            debug!(from = from.0, to = to.0, ty = ty.0, "graph.add_edge.present");
            return Ok(false);
        }
        let edge = Edge::new(from, to, ty);
        if !self.diff_minus.remove(&edge) {
            self.diff_plus.push(edge);
        }
        overlay_entry(&mut self.merged_forward, &self.forward, from).add(to, ty);
        overlay_entry(&mut self.merged_backward, &self.backward, to).add(from, ty);
        self.merged_len = self
            .merged_len
            .max(from.index() + 1)
            .max(to.index() + 1);
        self.metrics.edge_added();
        debug!(from = from.0, to = to.0, ty = ty.0, "graph.add_edge");
        Ok(true)
    }

    /// Deletes `from -> to` with [`EdgeType::DEFAULT`] in the pending batch.
    pub fn delete_edge_temporarily(&mut self, from: VertexId, to: VertexId) -> Result<bool> {
        self.delete_edge_temporarily_typed(from, to, EdgeType::DEFAULT)
    }

    /// Deletes a typed edge in the pending batch.
    ///
    /// Returns `Ok(false)` when the edge is absent from the merged view.
    pub fn delete_edge_temporarily_typed(
        &mut self,
        from: VertexId,
        to: VertexId,
        ty: EdgeType,
    ) -> Result<bool> {
        ensure_concrete(ty)?;
        if !self.merged_list(from, Direction::Forward).contains(to, ty) {
            debug!(from = from.0, to = to.0, ty = ty.0, "graph.delete_edge.absent");
            return Ok(false);
        }
        let edge = Edge::new(from, to, ty);
        if !self.diff_plus.remove(&edge) {
            self.diff_minus.push(edge);
        }
        overlay_entry(&mut self.merged_forward, &self.forward, from).remove_neighbour(to, ty);
        overlay_entry(&mut self.merged_backward, &self.backward, to).remove_neighbour(from, ty);
        self.metrics.edge_deleted();
        debug!(from = from.0, to = to.0, ty = ty.0, "graph.delete_edge");
        Ok(true)
    }

    /// Commits the pending batch into the permanent lists.
    ///
    /// Cost is proportional to the number of touched vertices. Calling it
    /// with nothing pending is a no-op.
    pub fn finalize_changes(&mut self) -> CommitStats {
        if !self.has_pending_changes() {
            return CommitStats::default();
        }
        self.forward
            .resize_with(self.merged_len, SortedAdjacencyList::new);
        self.backward
            .resize_with(self.merged_len, SortedAdjacencyList::new);
        let lists_replaced = self.merged_forward.len() + self.merged_backward.len();
        for (vertex, list) in self.merged_forward.drain() {
            self.forward[vertex.index()] = list;
        }
        for (vertex, list) in self.merged_backward.drain() {
            self.backward[vertex.index()] = list;
        }
        let stats = CommitStats {
            lists_replaced,
            edges_added: self.diff_plus.len(),
            edges_deleted: self.diff_minus.len(),
        };
        self.diff_plus.clear();
        self.diff_minus.clear();
        self.permanent_len = self.merged_len;
        self.metrics.commit(lists_replaced);
        info!(
            lists = stats.lists_replaced,
            added = stats.edges_added,
            deleted = stats.edges_deleted,
            vertices = self.permanent_len,
            "graph.finalize_changes"
        );
        stats
    }

    /// Drops every pending edit, leaving the permanent lists as they were.
    ///
    /// Returns the number of logged edges that were discarded.
    pub fn discard_changes(&mut self) -> usize {
        let discarded = self.diff_plus.len() + self.diff_minus.len();
        self.diff_plus.clear();
        self.diff_minus.clear();
        self.merged_forward.clear();
        self.merged_backward.clear();
        self.merged_len = self.permanent_len;
        debug!(discarded, "graph.discard_changes");
        discarded
    }

    /// Adjacency list of `vertex` in `direction` as seen by `version`.
    ///
    /// Vertices that exist only in pending edits read as empty in the
    /// permanent view. Diff versions are rejected with
    /// [`GraphError::Unsupported`].
    pub fn adjacency_list(
        &self,
        vertex: VertexId,
        direction: Direction,
        version: GraphVersion,
    ) -> Result<&SortedAdjacencyList> {
        if !version.is_indexable() {
            return Err(GraphError::Unsupported(
                "diff versions are enumerable, not indexable by vertex",
            ));
        }
        if vertex.index() >= self.merged_len {
            return Err(GraphError::VertexOutOfBounds {
                vertex,
                highest: self.highest_merged_vertex_id(),
            });
        }
        self.metrics.adjacency_lookup(version);
        Ok(self.view_list(vertex, direction, version))
    }

    /// Lazily enumerates the edges of `version`.
    pub fn edges(
        &self,
        version: GraphVersion,
        direction: Direction,
        filter: EdgeFilter,
    ) -> EdgeIter<'_> {
        EdgeIter::new(self, version, direction, filter)
    }

    /// Iterates `(vertex, forward list)` over the permanent view.
    pub(crate) fn permanent_forward(
        &self,
    ) -> impl Iterator<Item = (VertexId, &SortedAdjacencyList)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .map(|(idx, list)| (VertexId(idx as u32), list))
    }

    pub(crate) fn vertex_types(&self) -> &[VertexType] {
        &self.vertex_types
    }

    pub(crate) fn view_list(
        &self,
        vertex: VertexId,
        direction: Direction,
        version: GraphVersion,
    ) -> &SortedAdjacencyList {
        match version {
            GraphVersion::Merged => self.merged_list(vertex, direction),
            _ => self.permanent_list(vertex, direction),
        }
    }

    fn permanent_list(&self, vertex: VertexId, direction: Direction) -> &SortedAdjacencyList {
        let lists = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        };
        lists.get(vertex.index()).unwrap_or(&EMPTY_LIST)
    }

    fn merged_list(&self, vertex: VertexId, direction: Direction) -> &SortedAdjacencyList {
        let overlay = match direction {
            Direction::Forward => &self.merged_forward,
            Direction::Backward => &self.merged_backward,
        };
        match overlay.get(&vertex) {
            Some(list) => list,
            None => self.permanent_list(vertex, direction),
        }
    }
}

impl Default for VersionedGraph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl fmt::Debug for VersionedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedGraph")
            .field("permanent_vertices", &self.permanent_len)
            .field("merged_vertices", &self.merged_len)
            .field("diff_plus", &self.diff_plus.len())
            .field("diff_minus", &self.diff_minus.len())
            .field("overlay_forward", &self.merged_forward.len())
            .field("overlay_backward", &self.merged_backward.len())
            .finish()
    }
}

// Vertex bounds only grow from `u32` ids or a validated `from_edges` count.
fn highest_id(len: usize) -> Option<VertexId> {
    len.checked_sub(1)
        .and_then(|h| u32::try_from(h).ok())
        .map(VertexId)
}

fn ensure_concrete(ty: EdgeType) -> Result<()> {
    if ty.is_any() {
        return Err(GraphError::InvalidArgument(
            "the wildcard edge type cannot be stored".into(),
        ));
    }
    Ok(())
}

/// Overlay list for `vertex`, seeded from its permanent list on first touch.
fn overlay_entry<'a>(
    overlay: &'a mut Overlay,
    permanent: &[SortedAdjacencyList],
    vertex: VertexId,
) -> &'a mut SortedAdjacencyList {
    overlay
        .entry(vertex)
        .or_insert_with(|| permanent.get(vertex.index()).cloned().unwrap_or_default())
}
