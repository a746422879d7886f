//! Structural planner turning a pattern graph into intersection-rule plans.
//!
//! The textual query language lives outside the engine; this module only
//! knows about variables and directed (optionally typed) pattern edges. It
//! is enough to derive the per-edge plans the delta executor needs and a
//! reasonable default plan for one-off matches.

use serde::{Deserialize, Serialize};

use super::errors::PlanError;
use super::rule::{IntersectionRule, Plan, Stage};
use crate::types::{Direction, EdgeType, GraphVersion, Tuple, VertexId};

/// Directed pattern edge between two variables, by variable index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryEdge {
    /// Index of the source variable.
    pub from: usize,
    /// Index of the destination variable.
    pub to: usize,
    /// Required edge type, [`EdgeType::ANY`] for untyped edges.
    pub edge_type: EdgeType,
}

/// Pattern graph of a MATCH query.
///
/// Variables are interned by name in first-use order, which is also the
/// column order of tuples reported by [`OrderedPlan::to_declaration_order`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGraph {
    vars: Vec<String>,
    edges: Vec<QueryEdge>,
}

impl QueryGraph {
    /// Creates an empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an untyped edge `from -> to`, builder style.
    pub fn edge(self, from: &str, to: &str) -> Self {
        self.typed_edge(from, to, EdgeType::ANY)
    }

    /// Adds an edge `from -> to` restricted to `edge_type`, builder style.
    pub fn typed_edge(mut self, from: &str, to: &str, edge_type: EdgeType) -> Self {
        self.add_edge(from, to, edge_type);
        self
    }

    /// Adds an edge and returns its index.
    pub fn add_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) -> usize {
        let from = self.var(from);
        let to = self.var(to);
        self.edges.push(QueryEdge {
            from,
            to,
            edge_type,
        });
        self.edges.len() - 1
    }

    /// Interns `name`, returning its variable index.
    pub fn var(&mut self, name: &str) -> usize {
        match self.var_index(name) {
            Some(idx) => idx,
            None => {
                self.vars.push(name.to_owned());
                self.vars.len() - 1
            }
        }
    }

    /// Index of the variable called `name`, if declared.
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == name)
    }

    /// Variable names in declaration order.
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Pattern edges in declaration order.
    pub fn edges(&self) -> &[QueryEdge] {
        &self.edges
    }

    /// Rejects empty, self-looping, and disconnected patterns.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.ordering_from(0).map(|_| ())
    }

    /// Variable order starting with the endpoints of `edge`.
    ///
    /// Each following variable is the unvisited one with the most pattern
    /// edges into the visited set; ties go to the lower variable index.
    pub fn ordering_from(&self, edge: usize) -> Result<Vec<usize>, PlanError> {
        self.check_edges()?;
        let seed = self
            .edges
            .get(edge)
            .ok_or(PlanError::UnknownEdge { edge })?;
        let mut visited = vec![false; self.vars.len()];
        let mut ordering = Vec::with_capacity(self.vars.len());
        for var in [seed.from, seed.to] {
            visited[var] = true;
            ordering.push(var);
        }
        while ordering.len() < self.vars.len() {
            let mut best: Option<(usize, usize)> = None;
            for var in (0..self.vars.len()).filter(|&v| !visited[v]) {
                let links = self
                    .edges
                    .iter()
                    .filter(|e| {
                        (e.from == var && visited[e.to]) || (e.to == var && visited[e.from])
                    })
                    .count();
                if links > 0 && best.map_or(true, |(_, most)| links > most) {
                    best = Some((var, links));
                }
            }
            let Some((var, _)) = best else {
                let var = visited.iter().position(|seen| !seen).unwrap_or_default();
                return Err(PlanError::Disconnected {
                    var: self.vars[var].clone(),
                });
            };
            visited[var] = true;
            ordering.push(var);
        }
        Ok(ordering)
    }

    /// Builds the plan for `ordering`, reading pattern edge `i` from
    /// `versions[i]` and seeding from pattern edge `seed`.
    ///
    /// Every edge becomes one rule in the stage that binds its later
    /// endpoint; the seed edge must join the first two ordered variables
    /// and becomes the first rule of stage 0.
    pub fn plan(
        &self,
        ordering: &[usize],
        versions: &[GraphVersion],
        seed: usize,
    ) -> Result<OrderedPlan, PlanError> {
        self.check_edges()?;
        if versions.len() != self.edges.len() {
            return Err(PlanError::VersionCount {
                expected: self.edges.len(),
                found: versions.len(),
            });
        }
        let positions = self.positions(ordering)?;
        if seed >= self.edges.len() {
            return Err(PlanError::UnknownEdge { edge: seed });
        }

        let mut stages: Vec<Stage> = vec![Vec::new(); ordering.len() - 1];
        for (idx, edge) in self.edges.iter().enumerate() {
            let (from_pos, to_pos) = (positions[edge.from], positions[edge.to]);
            let (slot, bound, direction) = if from_pos < to_pos {
                (from_pos, to_pos, Direction::Forward)
            } else {
                (to_pos, from_pos, Direction::Backward)
            };
            let stage = bound - 1;
            if idx == seed && stage != 0 {
                return Err(PlanError::SeedNotFirst { edge: seed });
            }
            let rule = IntersectionRule::new(slot, direction, versions[idx], edge.edge_type);
            if idx == seed {
                stages[0].insert(0, rule);
            } else {
                stages[stage].push(rule);
            }
        }
        if let Some(pos) = stages.iter().position(Vec::is_empty) {
            return Err(PlanError::Disconnected {
                var: self.vars[ordering[pos + 1]].clone(),
            });
        }

        let plan = Plan::new(stages);
        plan.validate()?;
        Ok(OrderedPlan {
            plan,
            ordering: ordering.to_vec(),
        })
    }

    /// Plan over the merged view, seeded from the first pattern edge.
    pub fn default_plan(&self) -> Result<OrderedPlan, PlanError> {
        let ordering = self.ordering_from(0)?;
        let versions = vec![GraphVersion::Merged; self.edges.len()];
        self.plan(&ordering, &versions, 0)
    }

    fn check_edges(&self) -> Result<(), PlanError> {
        if self.edges.is_empty() {
            return Err(PlanError::EmptyQuery);
        }
        if let Some(edge) = self.edges.iter().find(|e| e.from == e.to) {
            return Err(PlanError::SelfLoop {
                var: self.vars[edge.from].clone(),
            });
        }
        Ok(())
    }

    /// Inverse of `ordering`; rejects anything that is not a permutation.
    fn positions(&self, ordering: &[usize]) -> Result<Vec<usize>, PlanError> {
        let expected = self.vars.len();
        let invalid = PlanError::InvalidOrdering { expected };
        if ordering.len() != expected {
            return Err(invalid);
        }
        let mut positions = vec![usize::MAX; expected];
        for (pos, &var) in ordering.iter().enumerate() {
            match positions.get_mut(var) {
                Some(slot) if *slot == usize::MAX => *slot = pos,
                _ => return Err(invalid),
            }
        }
        Ok(positions)
    }
}

/// A plan together with the variable order its tuples are bound in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedPlan {
    /// The executable plan.
    pub plan: Plan,
    /// `ordering[slot]` is the variable bound at prefix slot `slot`.
    pub ordering: Vec<usize>,
}

impl OrderedPlan {
    /// Reorders an emitted tuple into variable declaration order.
    pub fn to_declaration_order(&self, tuple: &[VertexId]) -> Tuple {
        let mut out = vec![VertexId(0); tuple.len()];
        for (slot, &var) in self.ordering.iter().enumerate() {
            if let (Some(dst), Some(&value)) = (out.get_mut(var), tuple.get(slot)) {
                *dst = value;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> QueryGraph {
        QueryGraph::new().edge("a", "b").edge("b", "c").edge("c", "a")
    }

    #[test]
    fn triangle_default_plan() {
        let ordered = triangle().default_plan().unwrap();
        assert_eq!(ordered.ordering, vec![0, 1, 2]);
        let expected = Plan::new(vec![
            vec![IntersectionRule::forward(0)],
            vec![IntersectionRule::forward(1), IntersectionRule::backward(0)],
        ]);
        assert_eq!(ordered.plan, expected);
    }

    #[test]
    fn seed_edge_leads_stage_zero() {
        let query = QueryGraph::new().edge("a", "b").edge("b", "a");
        let ordering = query.ordering_from(1).unwrap();
        assert_eq!(ordering, vec![1, 0]);
        let versions = [GraphVersion::Permanent, GraphVersion::DiffPlus];
        let ordered = query.plan(&ordering, &versions, 1).unwrap();
        let stage = &ordered.plan.stages[0];
        assert_eq!(stage.len(), 2);
        assert_eq!(stage[0].version, GraphVersion::DiffPlus);
        assert_eq!(stage[0].direction, Direction::Forward);
        assert_eq!(stage[1].direction, Direction::Backward);
    }

    #[test]
    fn ordering_prefers_most_connected_variable() {
        let query = QueryGraph::new()
            .edge("a", "b")
            .edge("a", "c")
            .edge("d", "a")
            .edge("d", "b");
        assert_eq!(query.ordering_from(0).unwrap(), vec![0, 1, 3, 2]);
    }

    #[test]
    fn rejects_malformed_queries() {
        assert_eq!(QueryGraph::new().validate(), Err(PlanError::EmptyQuery));
        let looped = QueryGraph::new().edge("a", "a");
        assert_eq!(looped.validate().unwrap_err().code(), "SelfLoop");
        let split = QueryGraph::new().edge("a", "b").edge("c", "d");
        assert_eq!(
            split.validate(),
            Err(PlanError::Disconnected { var: "c".into() })
        );
        assert_eq!(
            triangle().ordering_from(7),
            Err(PlanError::UnknownEdge { edge: 7 })
        );
    }

    #[test]
    fn rejects_bad_orderings_and_seeds() {
        let query = triangle();
        let merged = [GraphVersion::Merged; 3];
        assert_eq!(
            query.plan(&[0, 0, 1], &merged, 0),
            Err(PlanError::InvalidOrdering { expected: 3 })
        );
        assert_eq!(
            query.plan(&[0, 1, 2], &merged, 1),
            Err(PlanError::SeedNotFirst { edge: 1 })
        );
        assert_eq!(
            query.plan(&[0, 1, 2], &merged[..2], 0),
            Err(PlanError::VersionCount {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn disconnected_ordering_is_rejected_by_plan() {
        let query = QueryGraph::new().edge("a", "b").edge("b", "c");
        let merged = [GraphVersion::Merged; 2];
        assert_eq!(
            query.plan(&[0, 2, 1], &merged, 0),
            Err(PlanError::SeedNotFirst { edge: 0 })
        );
        assert_eq!(
            query.plan(&[1, 2, 0], &merged, 1).map(|p| p.plan.stages.len()),
            Ok(2)
        );
    }

    #[test]
    fn tuples_map_back_to_declaration_order() {
        let ordered = OrderedPlan {
            plan: Plan::default(),
            ordering: vec![2, 0, 1],
        };
        let tuple = [VertexId(7), VertexId(8), VertexId(9)];
        assert_eq!(
            ordered.to_declaration_order(&tuple),
            vec![VertexId(8), VertexId(9), VertexId(7)]
        );
    }
}
