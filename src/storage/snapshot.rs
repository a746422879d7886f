//! Explicit snapshot/restore of the committed graph.
//!
//! This is the only persistence surface of the engine: pending edits are not
//! captured, and nothing is written unless a caller asks for it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::graph::VersionedGraph;
use super::options::GraphOptions;
use crate::types::{Edge, GraphError, Result, VertexId, VertexType};

/// Serializable image of the permanent view of a [`VersionedGraph`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Number of vertex slots (highest permanent id + 1).
    pub vertex_count: usize,
    /// Explicit vertex types; vertices past the end are untyped.
    #[serde(default)]
    pub vertex_types: Vec<VertexType>,
    /// Every committed edge, sorted by `(from, to, type)`.
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Serializes the snapshot as JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Reads a JSON snapshot.
    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes the snapshot to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a snapshot previously written with [`GraphSnapshot::save`].
    pub fn load(path: &Path) -> Result<Self> {
        Self::read_json(BufReader::new(File::open(path)?))
    }
}

impl VersionedGraph {
    /// Captures the committed graph. Pending edits are ignored.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (from, list) in self.permanent_forward() {
            edges.extend(list.iter().map(|(to, ty)| Edge::new(from, to, ty)));
        }
        let mut vertex_types = self.vertex_types().to_vec();
        while vertex_types.last() == Some(&VertexType::DEFAULT) {
            vertex_types.pop();
        }
        GraphSnapshot {
            vertex_count: self.vertex_count(crate::types::GraphVersion::Permanent),
            vertex_types,
            edges,
        }
    }

    /// Rebuilds a graph whose permanent view equals `snapshot`.
    pub fn restore(snapshot: &GraphSnapshot, options: GraphOptions) -> Result<Self> {
        let mut graph =
            VersionedGraph::from_edges(snapshot.vertex_count, snapshot.edges.iter().copied(), options)?;
        for (idx, &ty) in snapshot.vertex_types.iter().enumerate() {
            if ty.is_any() {
                return Err(GraphError::InvalidArgument(format!(
                    "vertex {idx} carries the wildcard type"
                )));
            }
            graph.set_vertex_type(VertexId(idx as u32), ty)?;
        }
        info!(
            vertices = snapshot.vertex_count,
            edges = snapshot.edges.len(),
            "graph.restore"
        );
        Ok(graph)
    }
}
