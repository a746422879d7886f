#![forbid(unsafe_code)]

//! Plan and query-shape validation errors.

use thiserror::Error;

use crate::types::GraphVersion;

/// Structured errors for malformed plans and query graphs.
///
/// Plans are produced outside the engine, so the executor checks the shape
/// it relies on before touching the graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A plan needs at least the seed stage.
    #[error("plan has no stages")]
    EmptyPlan,
    /// Every stage needs at least one rule.
    #[error("stage {stage} has no intersection rules")]
    EmptyStage {
        /// Index of the empty stage.
        stage: usize,
    },
    /// The seed rule must read prefix slot 0.
    #[error("seed rule must read prefix slot 0 (got {slot})")]
    SeedSlot {
        /// Slot the seed rule reads.
        slot: usize,
    },
    /// A rule references a prefix slot that is not bound yet.
    #[error("stage {stage} rule {rule} reads slot {slot} but the prefix has {width} slots")]
    SlotOutOfRange {
        /// Stage holding the rule.
        stage: usize,
        /// Position of the rule in its stage.
        rule: usize,
        /// Slot the rule reads.
        slot: usize,
        /// Slots bound before the stage runs.
        width: usize,
    },
    /// Diff versions cannot be looked up by vertex, so they may only seed.
    #[error("stage {stage} rule {rule} uses {version:?}, which is only allowed on the seed rule")]
    DiffNotSeed {
        /// Stage holding the rule.
        stage: usize,
        /// Position of the rule in its stage.
        rule: usize,
        /// The diff version the rule reads.
        version: GraphVersion,
    },
    /// A query graph needs at least one edge.
    #[error("query has no edges")]
    EmptyQuery,
    /// Self loops have no intersection-rule encoding.
    #[error("self loop on variable '{var}' is not supported")]
    SelfLoop {
        /// Variable on both ends of the edge.
        var: String,
    },
    /// The variable has no edge into the variables ordered before it.
    #[error("variable '{var}' is not connected to the variables ordered before it")]
    Disconnected {
        /// The unreachable variable.
        var: String,
    },
    /// Edge index outside the query graph.
    #[error("query has no edge {edge}")]
    UnknownEdge {
        /// Requested edge index.
        edge: usize,
    },
    /// Ordering is not a permutation of the query variables.
    #[error("ordering must list each of the {expected} query variables exactly once")]
    InvalidOrdering {
        /// Number of query variables.
        expected: usize,
    },
    /// The seed edge does not join the first two ordered variables.
    #[error("seed edge {edge} does not connect the first two ordered variables")]
    SeedNotFirst {
        /// Index of the seed edge.
        edge: usize,
    },
    /// One graph version is needed per query edge.
    #[error("expected {expected} edge versions (got {found})")]
    VersionCount {
        /// Number of query edges.
        expected: usize,
        /// Versions supplied.
        found: usize,
    },
}

impl PlanError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::EmptyPlan => "EmptyPlan",
            PlanError::EmptyStage { .. } => "EmptyStage",
            PlanError::SeedSlot { .. } => "SeedSlot",
            PlanError::SlotOutOfRange { .. } => "SlotOutOfRange",
            PlanError::DiffNotSeed { .. } => "DiffNotSeed",
            PlanError::EmptyQuery => "EmptyQuery",
            PlanError::SelfLoop { .. } => "SelfLoop",
            PlanError::Disconnected { .. } => "Disconnected",
            PlanError::UnknownEdge { .. } => "UnknownEdge",
            PlanError::InvalidOrdering { .. } => "InvalidOrdering",
            PlanError::SeedNotFirst { .. } => "SeedNotFirst",
            PlanError::VersionCount { .. } => "VersionCount",
        }
    }
}
