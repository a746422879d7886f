#![forbid(unsafe_code)]

//! Generic Join query execution.
//!
//! Plans are ordered stages of intersection rules. The executors read the
//! versioned graph and push matches to caller-provided sinks.

/// Pattern graphs and plan construction.
pub mod builder;

/// CONTINUOUS MATCH registry.
pub mod continuous;

/// Incremental (delta) evaluation across a pending edit batch.
pub mod delta;

/// Plan and query-shape errors.
pub mod errors;

/// The Generic Join executor.
pub mod executor;

/// Intersection rules, stages and plans.
pub mod rule;

/// Output sinks for full and delta results.
pub mod sink;

pub use builder::{OrderedPlan, QueryEdge, QueryGraph};
pub use continuous::{ApplyReport, ContinuousMatches, ContinuousQueryId};
pub use delta::{DeltaGenericJoinExecutor, DeltaStats};
pub use errors::PlanError;
pub use executor::{GenericJoinExecutor, JoinOptions, JoinStats, DEFAULT_BATCH_SIZE};
pub use rule::{IntersectionRule, Plan, Stage};
pub use sink::{CountingSink, DeltaMatches, DeltaSink, FnSink, MatchChange, OutputSink};
