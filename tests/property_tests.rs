use std::collections::BTreeSet;

use graphflow::query::{DeltaGenericJoinExecutor, GenericJoinExecutor, QueryGraph};
use graphflow::storage::{EdgeFilter, GraphOptions, VersionedGraph};
use graphflow::types::{Direction, Edge, EdgeType, GraphVersion, Tuple, VertexId};
use proptest::prelude::*;

const VERTICES: u32 = 6;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(Edge),
    Delete(Edge),
}

fn arb_edge() -> impl Strategy<Value = Edge> {
    (0..VERTICES, 0..VERTICES, 0..2i16)
        .prop_map(|(from, to, ty)| Edge::new(VertexId(from), VertexId(to), EdgeType(ty)))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_edge().prop_map(Op::Add),
        arb_edge().prop_map(Op::Delete),
    ]
}

fn patterns() -> Vec<QueryGraph> {
    vec![
        QueryGraph::new().edge("a", "b"),
        QueryGraph::new().edge("a", "b").edge("b", "c"),
        QueryGraph::new().edge("a", "b").edge("b", "a"),
        QueryGraph::new().edge("a", "b").edge("b", "c").edge("c", "a"),
        QueryGraph::new().edge("a", "b").edge("c", "b").edge("a", "c"),
        QueryGraph::new()
            .edge("a", "b")
            .edge("a", "c")
            .edge("b", "d")
            .edge("c", "d"),
        QueryGraph::new()
            .typed_edge("a", "b", EdgeType(0))
            .typed_edge("b", "c", EdgeType(1))
            .edge("c", "a"),
    ]
}

/// Every assignment of vertices to variables that maps each pattern edge
/// onto a graph edge of a matching type.
fn brute_force(query: &QueryGraph, edges: &BTreeSet<Edge>) -> BTreeSet<Tuple> {
    let width = query.vars().len();
    let total = (VERTICES as usize).pow(width as u32);
    let mut out = BTreeSet::new();
    for code in 0..total {
        let mut rest = code;
        let tuple: Tuple = (0..width)
            .map(|_| {
                let v = VertexId((rest % VERTICES as usize) as u32);
                rest /= VERTICES as usize;
                v
            })
            .collect();
        let matched = query.edges().iter().all(|qe| {
            edges.iter().any(|e| {
                e.from == tuple[qe.from] && e.to == tuple[qe.to] && qe.edge_type.matches(e.ty)
            })
        });
        if matched {
            out.insert(tuple);
        }
    }
    out
}

fn run_join(query: &QueryGraph, graph: &VersionedGraph) -> BTreeSet<Tuple> {
    let ordered = query.default_plan().unwrap();
    let mut rows: Vec<Tuple> = Vec::new();
    GenericJoinExecutor::new(&ordered.plan, graph, &mut rows)
        .execute()
        .unwrap();
    let total = rows.len();
    let set: BTreeSet<Tuple> = rows
        .iter()
        .map(|t| ordered.to_declaration_order(t))
        .collect();
    assert_eq!(set.len(), total, "join emitted a duplicate tuple");
    set
}

fn load(edges: &[Edge]) -> VersionedGraph {
    VersionedGraph::from_edges(VERTICES as usize, edges.iter().copied(), GraphOptions::default())
        .unwrap()
}

/// Applies `ops` to the graph and to a set model with skip-if-present rules.
fn apply(graph: &mut VersionedGraph, model: &mut BTreeSet<Edge>, ops: &[Op]) {
    for op in ops {
        match *op {
            Op::Add(e) => {
                let added = graph.add_edge_temporarily_typed(e.from, e.to, e.ty).unwrap();
                assert_eq!(added, model.insert(e));
            }
            Op::Delete(e) => {
                let deleted = graph
                    .delete_edge_temporarily_typed(e.from, e.to, e.ty)
                    .unwrap();
                assert_eq!(deleted, model.remove(&e));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn join_matches_brute_force(
        edges in prop::collection::vec(arb_edge(), 0..24),
        pattern in 0usize..7,
    ) {
        let graph = load(&edges);
        let model: BTreeSet<Edge> = edges.iter().copied().collect();
        let query = &patterns()[pattern];
        prop_assert_eq!(run_join(query, &graph), brute_force(query, &model));
    }

    #[test]
    fn commit_equals_fresh_build(
        initial in prop::collection::vec(arb_edge(), 0..16),
        ops in prop::collection::vec(arb_op(), 0..32),
    ) {
        let mut graph = load(&initial);
        let mut model: BTreeSet<Edge> = initial.iter().copied().collect();
        apply(&mut graph, &mut model, &ops);

        let merged: BTreeSet<Edge> = graph
            .edges(GraphVersion::Merged, Direction::Forward, EdgeFilter::all())
            .collect();
        prop_assert_eq!(&merged, &model);
        let plus: BTreeSet<Edge> = graph.diff(GraphVersion::DiffPlus).unwrap().iter().copied().collect();
        let before: BTreeSet<Edge> = initial.iter().copied().collect();
        prop_assert_eq!(plus, model.difference(&before).copied().collect::<BTreeSet<_>>());

        graph.finalize_changes();
        let fresh = load(&model.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(graph.snapshot().edges, fresh.snapshot().edges);
        let backward: BTreeSet<Edge> = graph
            .edges(GraphVersion::Permanent, Direction::Backward, EdgeFilter::all())
            .collect();
        prop_assert_eq!(&backward, &model);
        for v in 0..VERTICES {
            for dir in [Direction::Forward, Direction::Backward] {
                let ours = graph.adjacency_list(VertexId(v), dir, GraphVersion::Permanent).unwrap();
                let theirs = fresh.adjacency_list(VertexId(v), dir, GraphVersion::Permanent).unwrap();
                prop_assert_eq!(ours.iter().collect::<Vec<_>>(), theirs.iter().collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn repeated_edits_are_idempotent(
        initial in prop::collection::vec(arb_edge(), 0..16),
        ops in prop::collection::vec(arb_op(), 0..16),
    ) {
        let mut once = load(&initial);
        let mut twice = load(&initial);
        let (mut model_once, mut model_twice) = (BTreeSet::new(), BTreeSet::new());
        model_once.extend(initial.iter().copied());
        model_twice.extend(initial.iter().copied());
        apply(&mut once, &mut model_once, &ops);
        let doubled: Vec<Op> = ops.iter().flat_map(|op| [*op, *op]).collect();
        apply(&mut twice, &mut model_twice, &doubled);
        let view = |g: &VersionedGraph| -> Vec<Edge> {
            g.edges(GraphVersion::Merged, Direction::Forward, EdgeFilter::all()).collect()
        };
        prop_assert_eq!(view(&once), view(&twice));
    }

    #[test]
    fn delta_matches_recomputation(
        initial in prop::collection::vec(arb_edge(), 0..20),
        ops in prop::collection::vec(arb_op(), 1..12),
        pattern in 0usize..7,
        batch_size in 1usize..5,
    ) {
        let mut graph = load(&initial);
        let before: BTreeSet<Edge> = initial.iter().copied().collect();
        let mut after = before.clone();
        apply(&mut graph, &mut after, &ops);

        let query = &patterns()[pattern];
        let old = brute_force(query, &before);
        let new = brute_force(query, &after);
        let delta = DeltaGenericJoinExecutor::new(query, &graph)
            .with_options(graphflow::query::JoinOptions::new().batch_size(batch_size))
            .execute_collect()
            .unwrap();

        let emerged: Vec<Tuple> = new.difference(&old).cloned().collect();
        let deleted: Vec<Tuple> = old.difference(&new).cloned().collect();
        prop_assert_eq!(delta.emerged, emerged);
        prop_assert_eq!(delta.deleted, deleted);

        graph.finalize_changes();
        prop_assert_eq!(run_join(query, &graph), new);
    }
}
