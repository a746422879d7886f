use graphflow::query::{
    CountingSink, DeltaGenericJoinExecutor, GenericJoinExecutor, IntersectionRule, JoinOptions,
    Plan, QueryGraph,
};
use graphflow::storage::{EdgeFilter, GraphOptions, GraphSnapshot, VersionedGraph};
use graphflow::types::{Direction, Edge, EdgeType, GraphVersion, Tuple, VertexId, VertexType};
use graphflow::Result;

fn v(id: u32) -> VertexId {
    VertexId(id)
}

fn tuples(raw: &[&[u32]]) -> Vec<Tuple> {
    raw.iter()
        .map(|t| t.iter().copied().map(VertexId).collect())
        .collect()
}

fn triangle_plan() -> Plan {
    Plan::new(vec![
        vec![IntersectionRule::forward(0)],
        vec![IntersectionRule::forward(1), IntersectionRule::backward(0)],
    ])
}

fn ids(graph: &VersionedGraph, vertex: u32, version: GraphVersion) -> Result<Vec<u32>> {
    let list = graph.adjacency_list(v(vertex), Direction::Forward, version)?;
    Ok(list.neighbour_ids().iter().map(|id| id.0).collect())
}

#[test]
fn directed_triangle_matches_every_rotation() -> Result<()> {
    let graph = VersionedGraph::from_edges(
        3,
        [Edge::untyped(0, 1), Edge::untyped(1, 2), Edge::untyped(2, 0)],
        GraphOptions::default(),
    )?;
    let plan = triangle_plan();
    let mut out: Vec<Tuple> = Vec::new();
    GenericJoinExecutor::new(&plan, &graph, &mut out).execute()?;
    out.sort();
    assert_eq!(out, tuples(&[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]]));
    Ok(())
}

#[test]
fn temporary_edge_becomes_permanent_on_commit() -> Result<()> {
    let mut graph = VersionedGraph::default();
    graph.add_edge_temporarily(v(0), v(1))?;
    assert_eq!(ids(&graph, 0, GraphVersion::Merged)?, vec![1]);
    assert!(ids(&graph, 0, GraphVersion::Permanent)?.is_empty());

    graph.finalize_changes();
    assert_eq!(ids(&graph, 0, GraphVersion::Permanent)?, vec![1]);
    let pending: Vec<Edge> = graph
        .edges(GraphVersion::DiffPlus, Direction::Forward, EdgeFilter::all())
        .collect();
    assert!(pending.is_empty());
    Ok(())
}

#[test]
fn delta_reports_only_matches_closed_by_the_new_edge() -> Result<()> {
    let mut graph = VersionedGraph::from_edges(
        6,
        [
            Edge::untyped(0, 1),
            Edge::untyped(1, 2),
            Edge::untyped(3, 4),
            Edge::untyped(4, 5),
            Edge::untyped(5, 3),
        ],
        GraphOptions::default(),
    )?;
    graph.add_edge_temporarily(v(2), v(0))?;
    let query = QueryGraph::new().edge("a", "b").edge("b", "c").edge("c", "a");
    let delta = DeltaGenericJoinExecutor::new(&query, &graph).execute_collect()?;
    assert_eq!(delta.emerged, tuples(&[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]]));
    assert!(delta.deleted.is_empty());

    // The full join over the merged view also sees the untouched triangle.
    let ordered = query.default_plan()?;
    let mut counter = GenericJoinExecutor::new(&ordered.plan, &graph, CountingSink::default());
    counter.execute()?;
    assert_eq!(counter.sink().tuples, 6);

    // Re-adding an existing edge changes nothing.
    graph.finalize_changes();
    assert!(!graph.add_edge_temporarily(v(2), v(0))?);
    let delta = DeltaGenericJoinExecutor::new(&query, &graph).execute_collect()?;
    assert!(delta.is_empty());
    Ok(())
}

#[test]
fn four_cycle_with_small_batches() -> Result<()> {
    let mut edges = Vec::new();
    for a in 0..6u32 {
        for b in 0..6u32 {
            if a != b && (a + 2 * b) % 4 != 1 {
                edges.push(Edge::untyped(a, b));
            }
        }
    }
    let graph = VersionedGraph::from_edges(6, edges.clone(), GraphOptions::default())?;
    let query = QueryGraph::new()
        .edge("a", "b")
        .edge("b", "c")
        .edge("c", "d")
        .edge("d", "a");
    let ordered = query.default_plan()?;

    let mut expected = 0u64;
    let has = |a: u32, b: u32| edges.contains(&Edge::untyped(a, b));
    for a in 0..6 {
        for b in 0..6 {
            for c in 0..6 {
                for d in 0..6 {
                    if has(a, b) && has(b, c) && has(c, d) && has(d, a) {
                        expected += 1;
                    }
                }
            }
        }
    }
    assert!(expected > 0);
    for batch_size in [1, 3, 64] {
        let mut executor = GenericJoinExecutor::new(&ordered.plan, &graph, CountingSink::default())
            .with_options(JoinOptions::new().batch_size(batch_size));
        let stats = executor.execute()?;
        assert_eq!(stats.tuples_emitted, expected);
        assert_eq!(executor.sink().tuples, expected);
    }
    Ok(())
}

#[test]
fn vertex_type_filters_restrict_enumeration() -> Result<()> {
    let mut graph = VersionedGraph::from_edges(
        4,
        [Edge::untyped(0, 1), Edge::untyped(2, 3), Edge::untyped(1, 3)],
        GraphOptions::default(),
    )?;
    graph.set_vertex_type(v(3), VertexType(9))?;
    let filter = EdgeFilter::all().to_type(VertexType(9));
    let edges: Vec<Edge> = graph
        .edges(GraphVersion::Permanent, Direction::Forward, filter)
        .collect();
    assert_eq!(edges, vec![Edge::untyped(1, 3), Edge::untyped(2, 3)]);
    Ok(())
}

#[test]
fn snapshot_preserves_join_results() -> Result<()> {
    let mut graph = VersionedGraph::default();
    for (a, b, ty) in [(0, 1, 1), (1, 2, 1), (2, 0, 2), (2, 0, 1)] {
        graph.add_edge_temporarily_typed(v(a), v(b), EdgeType(ty))?;
    }
    graph.finalize_changes();

    let mut buffer: Vec<u8> = Vec::new();
    graph.snapshot().write_json(&mut buffer)?;
    let snapshot = GraphSnapshot::read_json(buffer.as_slice())?;
    let restored = VersionedGraph::restore(&snapshot, GraphOptions::default())?;

    let plan = triangle_plan();
    let mut before: Vec<Tuple> = Vec::new();
    GenericJoinExecutor::new(&plan, &graph, &mut before).execute()?;
    let mut after: Vec<Tuple> = Vec::new();
    GenericJoinExecutor::new(&plan, &restored, &mut after).execute()?;
    before.sort();
    after.sort();
    assert_eq!(before.len(), 3);
    assert_eq!(before, after);
    Ok(())
}
