use super::CliError;
use crate::query::QueryGraph;
use crate::types::{Edge, EdgeType, VertexId};

/// Builds a pattern graph from `a:b[:type]` arguments.
pub fn parse_query<S: AsRef<str>>(specs: &[S]) -> Result<QueryGraph, CliError> {
    let mut query = QueryGraph::new();
    for spec in specs {
        let spec = spec.as_ref();
        let (from, to, ty) = split_spec(spec)?;
        if from.is_empty() || to.is_empty() {
            return Err(CliError::Message(format!(
                "pattern edge '{spec}' needs two variable names"
            )));
        }
        let ty = match ty {
            Some(raw) => parse_type(raw, spec)?,
            None => EdgeType::ANY,
        };
        query.add_edge(from, to, ty);
    }
    query.validate()?;
    Ok(query)
}

/// Parses a `from:to[:type]` graph edge; untyped edges get the default type.
pub fn parse_edge(spec: &str) -> Result<Edge, CliError> {
    let (from, to, ty) = split_spec(spec)?;
    let vertex = |raw: &str| {
        raw.parse::<u32>()
            .map(VertexId)
            .map_err(|_| CliError::Message(format!("'{raw}' in '{spec}' is not a vertex id")))
    };
    let ty = match ty {
        Some(raw) => parse_type(raw, spec)?,
        None => EdgeType::DEFAULT,
    };
    Ok(Edge::new(vertex(from)?, vertex(to)?, ty))
}

fn split_spec(spec: &str) -> Result<(&str, &str, Option<&str>), CliError> {
    let mut parts = spec.split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(from), Some(to), ty, None) => Ok((from, to, ty)),
        _ => Err(CliError::Message(format!(
            "'{spec}' is not of the form from:to[:type]"
        ))),
    }
}

fn parse_type(raw: &str, spec: &str) -> Result<EdgeType, CliError> {
    match raw.parse::<i16>() {
        Ok(ty) if ty >= 0 => Ok(EdgeType(ty)),
        _ => Err(CliError::Message(format!(
            "'{raw}' in '{spec}' is not a non-negative edge type"
        ))),
    }
}
