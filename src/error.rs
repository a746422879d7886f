//! Crate-wide error type.

use std::io;

use thiserror::Error;

use crate::query::PlanError;
use crate::types::VertexId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the graph store and the join engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A vertex id beyond the graph's vertex bound.
    #[error("vertex {vertex} out of bounds (highest vertex id is {highest:?})")]
    VertexOutOfBounds {
        /// The offending vertex.
        vertex: VertexId,
        /// Highest valid id, `None` for an empty graph.
        highest: Option<VertexId>,
    },
    /// A position beyond the end of an adjacency list.
    #[error("index {index} out of bounds for adjacency list of length {len}")]
    IndexOutOfBounds {
        /// Requested position.
        index: usize,
        /// Length of the list.
        len: usize,
    },
    /// Operation not defined for the requested graph version.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A caller-supplied value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A plan or query graph failed validation.
    #[error("invalid plan: {0}")]
    Plan(#[from] PlanError),
    /// Snapshot file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot JSON could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// CSV edge input could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl GraphError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::VertexOutOfBounds { .. } => "VertexOutOfBounds",
            GraphError::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            GraphError::Unsupported(_) => "Unsupported",
            GraphError::InvalidArgument(_) => "InvalidArgument",
            GraphError::Plan(err) => err.code(),
            GraphError::Io(_) => "Io",
            GraphError::Serialization(_) => "Serialization",
            GraphError::Csv(_) => "Csv",
        }
    }
}
