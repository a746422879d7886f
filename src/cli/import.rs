use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use super::CliError;
use crate::storage::{GraphOptions, VersionedGraph};
use crate::types::{Edge, EdgeType, VertexId};

/// Where and how to read a CSV edge list.
#[derive(Debug, Clone)]
pub struct EdgeCsvConfig {
    /// Path to the CSV file.
    pub path: PathBuf,
    /// Column holding the source vertex id.
    pub from_column: String,
    /// Column holding the destination vertex id.
    pub to_column: String,
    /// Optional column holding a numeric edge type; untyped edges otherwise.
    pub type_column: Option<String>,
    /// Vertex count bound; defaults to the highest id seen plus one.
    pub vertex_count: Option<usize>,
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl EdgeCsvConfig {
    /// Defaults to `from`/`to` columns, no type column, comma separated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            from_column: "from".into(),
            to_column: "to".into(),
            type_column: None,
            vertex_count: None,
            delimiter: b',',
        }
    }
}

/// Counts from a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows read.
    pub rows: u64,
    /// Distinct edges stored.
    pub edges: usize,
    /// Vertex bound of the loaded graph.
    pub vertex_count: usize,
}

/// Reads every edge of the file, in file order.
pub fn read_edge_csv(cfg: &EdgeCsvConfig) -> Result<Vec<Edge>, CliError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(cfg.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&cfg.path)?;
    let headers = reader.headers()?.clone();
    let from_index = find_column(&headers, &cfg.from_column)?;
    let to_index = find_column(&headers, &cfg.to_column)?;
    let ty_index = match &cfg.type_column {
        Some(col) => Some(find_column(&headers, col)?),
        None => None,
    };

    let mut edges = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let from = parse_vertex(&record, from_index, &cfg.from_column, row)?;
        let to = parse_vertex(&record, to_index, &cfg.to_column, row)?;
        let ty = match (ty_index, &cfg.type_column) {
            (Some(idx), Some(name)) => parse_edge_type(get_required(&record, idx, name)?, row)?,
            _ => EdgeType::DEFAULT,
        };
        edges.push(Edge::new(from, to, ty));
    }
    Ok(edges)
}

/// Reads a CSV edge list and bulk-loads it into a new graph.
pub fn load_edge_csv(
    cfg: &EdgeCsvConfig,
    options: GraphOptions,
) -> Result<(VersionedGraph, ImportSummary), CliError> {
    let edges = read_edge_csv(cfg)?;
    let seen = edges
        .iter()
        .map(|e| e.from.index().max(e.to.index()) + 1)
        .max()
        .unwrap_or(0);
    let vertex_count = cfg.vertex_count.unwrap_or(seen);
    let rows = edges.len() as u64;
    let graph = VersionedGraph::from_edges(vertex_count, edges, options)?;
    let summary = ImportSummary {
        rows,
        edges: graph.edge_count(),
        vertex_count,
    };
    info!(
        path = %cfg.path.display(),
        rows = summary.rows,
        edges = summary.edges,
        vertices = summary.vertex_count,
        "cli.import"
    );
    Ok((graph, summary))
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::Message(format!("column '{name}' not found")))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, CliError> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::Message(format!("missing value for column '{name}'")))
}

fn parse_vertex(
    record: &StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<VertexId, CliError> {
    let raw = get_required(record, idx, name)?;
    raw.parse::<u32>().map(VertexId).map_err(|_| {
        CliError::Message(format!(
            "row {}: '{raw}' is not a vertex id in column '{name}'",
            row + 1
        ))
    })
}

fn parse_edge_type(raw: &str, row: usize) -> Result<EdgeType, CliError> {
    match raw.parse::<i16>() {
        Ok(ty) if ty >= 0 => Ok(EdgeType(ty)),
        _ => Err(CliError::Message(format!(
            "row {}: '{raw}' is not a non-negative edge type",
            row + 1
        ))),
    }
}
