//! Declarative plan description consumed by the join executors.

use serde::{Deserialize, Serialize};

use super::errors::PlanError;
use crate::types::{Direction, EdgeType, GraphVersion};

/// One relation used to extend a prefix by a new vertex.
///
/// With `Forward` the new vertex must be an out-neighbour of
/// `prefix[prefix_slot]` (edge `prefix[slot] -> new`); with `Backward` it
/// must be an in-neighbour (edge `new -> prefix[slot]`). The neighbour list
/// is read from `version` and filtered by `edge_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntersectionRule {
    /// Prefix slot holding the vertex whose list is read.
    pub prefix_slot: usize,
    /// Which list of that vertex is read.
    pub direction: Direction,
    /// Graph view the list is read from.
    pub version: GraphVersion,
    /// Edge type filter, [`EdgeType::ANY`] for all.
    pub edge_type: EdgeType,
}

impl IntersectionRule {
    /// Creates a rule from all four parts.
    pub fn new(
        prefix_slot: usize,
        direction: Direction,
        version: GraphVersion,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            prefix_slot,
            direction,
            version,
            edge_type,
        }
    }

    /// Untyped forward rule against the merged view.
    pub fn forward(prefix_slot: usize) -> Self {
        Self::new(prefix_slot, Direction::Forward, GraphVersion::Merged, EdgeType::ANY)
    }

    /// Untyped backward rule against the merged view.
    pub fn backward(prefix_slot: usize) -> Self {
        Self::new(prefix_slot, Direction::Backward, GraphVersion::Merged, EdgeType::ANY)
    }

    /// Reads the list from `version` instead.
    pub fn with_version(mut self, version: GraphVersion) -> Self {
        self.version = version;
        self
    }

    /// Filters neighbours by `edge_type`.
    pub fn with_edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }
}

/// Rules that jointly bind the next prefix slot.
pub type Stage = Vec<IntersectionRule>;

/// Ordered stages. Stage 0 binds slots 0 and 1 from an edge enumeration;
/// stage `s` binds slot `s + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Stages in execution order.
    pub stages: Vec<Stage>,
}

impl Plan {
    /// Wraps `stages` without validating them.
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Number of vertices in each emitted tuple.
    pub fn tuple_width(&self) -> usize {
        self.stages.len() + 1
    }

    /// Checks the shape the executors rely on.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.stages.is_empty() {
            return Err(PlanError::EmptyPlan);
        }
        for (stage_idx, stage) in self.stages.iter().enumerate() {
            if stage.is_empty() {
                return Err(PlanError::EmptyStage { stage: stage_idx });
            }
            let bound = stage_idx + 1;
            for (rule_idx, rule) in stage.iter().enumerate() {
                let seed = stage_idx == 0 && rule_idx == 0;
                if seed && rule.prefix_slot != 0 {
                    return Err(PlanError::SeedSlot {
                        slot: rule.prefix_slot,
                    });
                }
                if rule.prefix_slot >= bound {
                    return Err(PlanError::SlotOutOfRange {
                        stage: stage_idx,
                        rule: rule_idx,
                        slot: rule.prefix_slot,
                        width: bound,
                    });
                }
                if !seed && !rule.version.is_indexable() {
                    return Err(PlanError::DiffNotSeed {
                        stage: stage_idx,
                        rule: rule_idx,
                        version: rule.version,
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Stage>> for Plan {
    fn from(stages: Vec<Stage>) -> Self {
        Self::new(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Plan {
        Plan::new(vec![
            vec![IntersectionRule::forward(0)],
            vec![IntersectionRule::forward(1), IntersectionRule::backward(0)],
        ])
    }

    #[test]
    fn triangle_plan_is_valid() {
        let plan = triangle();
        assert_eq!(plan.validate(), Ok(()));
        assert_eq!(plan.tuple_width(), 3);
    }

    #[test]
    fn empty_shapes_are_rejected() {
        assert_eq!(Plan::default().validate(), Err(PlanError::EmptyPlan));
        let plan = Plan::new(vec![vec![IntersectionRule::forward(0)], vec![]]);
        assert_eq!(plan.validate(), Err(PlanError::EmptyStage { stage: 1 }));
    }

    #[test]
    fn slots_must_be_bound() {
        let plan = Plan::new(vec![vec![IntersectionRule::forward(1)]]);
        assert_eq!(plan.validate(), Err(PlanError::SeedSlot { slot: 1 }));

        let plan = Plan::new(vec![
            vec![IntersectionRule::forward(0)],
            vec![IntersectionRule::forward(2)],
        ]);
        assert_eq!(plan.validate().unwrap_err().code(), "SlotOutOfRange");
    }

    #[test]
    fn diff_versions_only_seed() {
        let mut plan = triangle();
        plan.stages[0][0] = plan.stages[0][0].with_version(GraphVersion::DiffPlus);
        assert_eq!(plan.validate(), Ok(()));
        plan.stages[1][1] = plan.stages[1][1].with_version(GraphVersion::DiffMinus);
        assert_eq!(
            plan.validate(),
            Err(PlanError::DiffNotSeed {
                stage: 1,
                rule: 1,
                version: GraphVersion::DiffMinus
            })
        );
    }
}
