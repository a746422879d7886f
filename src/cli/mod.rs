#![forbid(unsafe_code)]

//! Command-line support: CSV edge import and pattern arguments.

use thiserror::Error;

use crate::types::GraphError;

/// Seeded random edge lists.
pub mod generate;

/// CSV edge-list import.
pub mod import;

/// Parsing of `a:b[:type]` pattern edges and `from:to[:type]` graph edges.
pub mod pattern;

/// Errors surfaced by the command-line layer.
#[derive(Debug, Error)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV input or output failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// JSON output failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The graph or query layer rejected the request.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

impl From<crate::query::PlanError> for CliError {
    fn from(value: crate::query::PlanError) -> Self {
        CliError::Graph(value.into())
    }
}
