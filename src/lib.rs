//! In-memory subgraph matching over a versioned adjacency-list graph.
//!
//! [`storage::VersionedGraph`] keeps a committed graph next to a pending
//! edit batch; [`query::GenericJoinExecutor`] evaluates intersection-rule
//! plans against any of its views, and [`query::DeltaGenericJoinExecutor`]
//! reports how MATCH results change when the batch is committed.

#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod query;
pub mod storage;
pub mod types;

pub use error::{GraphError, Result};
