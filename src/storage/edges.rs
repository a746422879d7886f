use super::adjacency::SortedAdjacencyList;
use super::graph::{VersionedGraph, EMPTY_LIST};
use super::log::EdgeLogIter;
use crate::types::{Direction, Edge, EdgeType, GraphVersion, VertexId, VertexType};

/// Type filters applied while enumerating edges.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeFilter {
    /// Required type of the source vertex.
    pub from_type: VertexType,
    /// Required type of the destination vertex.
    pub to_type: VertexType,
    /// Required edge type.
    pub edge_type: EdgeType,
}

impl EdgeFilter {
    /// Accepts every edge.
    pub fn all() -> Self {
        Self {
            from_type: VertexType::ANY,
            to_type: VertexType::ANY,
            edge_type: EdgeType::ANY,
        }
    }

    /// Accepts edges of type `ty` between vertices of any type.
    pub fn edge_type(ty: EdgeType) -> Self {
        Self {
            edge_type: ty,
            ..Self::all()
        }
    }

    /// Requires the source vertex to have type `ty`.
    pub fn from_type(mut self, ty: VertexType) -> Self {
        self.from_type = ty;
        self
    }

    /// Requires the destination vertex to have type `ty`.
    pub fn to_type(mut self, ty: VertexType) -> Self {
        self.to_type = ty;
        self
    }

    fn accepts(&self, graph: &VersionedGraph, edge: &Edge) -> bool {
        self.edge_type.matches(edge.ty)
            && (self.from_type.is_any() || self.from_type == graph.vertex_type(edge.from))
            && (self.to_type.is_any() || self.to_type == graph.vertex_type(edge.to))
    }
}

impl Default for EdgeFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Single-pass enumeration of the edges of one graph version.
///
/// Diff versions walk their edge log in edit order. `Permanent` and `Merged`
/// walk vertex ids ascending and, for each, the list selected by the
/// direction, substituting overlay lists for touched vertices under
/// `Merged`. Yielded edges always carry their true `from -> to` orientation.
pub struct EdgeIter<'g> {
    graph: &'g VersionedGraph,
    filter: EdgeFilter,
    source: Source<'g>,
}

enum Source<'g> {
    Log(Option<EdgeLogIter<'g>>),
    Lists(ListCursor<'g>),
}

struct ListCursor<'g> {
    version: GraphVersion,
    direction: Direction,
    vertex: VertexId,
    list: &'g SortedAdjacencyList,
    position: usize,
    next_vertex: usize,
    end: usize,
}

impl<'g> EdgeIter<'g> {
    pub(crate) fn new(
        graph: &'g VersionedGraph,
        version: GraphVersion,
        direction: Direction,
        filter: EdgeFilter,
    ) -> Self {
        let source = match version {
            GraphVersion::DiffPlus | GraphVersion::DiffMinus => {
                Source::Log(graph.diff(version).ok().map(|log| log.iter()))
            }
            GraphVersion::Permanent | GraphVersion::Merged => Source::Lists(ListCursor {
                version,
                direction,
                vertex: VertexId(0),
                list: &EMPTY_LIST,
                position: 0,
                next_vertex: 0,
                end: graph.vertex_count(version),
            }),
        };
        Self {
            graph,
            filter,
            source,
        }
    }
}

impl Iterator for EdgeIter<'_> {
    type Item = Edge;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        let filter = self.filter;
        match &mut self.source {
            Source::Log(log) => log
                .as_mut()?
                .find(|edge| filter.accepts(graph, edge))
                .copied(),
            Source::Lists(cursor) => loop {
                if cursor.position < cursor.list.len() {
                    let (neighbour, ty) = cursor.list.entry(cursor.position);
                    cursor.position += 1;
                    let edge = match cursor.direction {
                        Direction::Forward => Edge::new(cursor.vertex, neighbour, ty),
                        Direction::Backward => Edge::new(neighbour, cursor.vertex, ty),
                    };
                    if filter.accepts(graph, &edge) {
                        return Some(edge);
                    }
                } else if cursor.next_vertex < cursor.end {
                    cursor.vertex = VertexId(cursor.next_vertex as u32);
                    cursor.list = graph.view_list(cursor.vertex, cursor.direction, cursor.version);
                    cursor.position = 0;
                    cursor.next_vertex += 1;
                } else {
                    return None;
                }
            },
        }
    }
}
