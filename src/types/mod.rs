//! Identifiers and small value types shared by the storage and query layers.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::error::{GraphError, Result};

/// Dense vertex identifier. A vertex exists once it appears in an edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Returns the id as an array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(value: u32) -> Self {
        VertexId(value)
    }
}

impl From<VertexId> for u32 {
    fn from(value: VertexId) -> Self {
        value.0
    }
}

/// 16-bit edge type tag assigned by an external type interner.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeType(pub i16);

impl EdgeType {
    /// Wildcard filter. Never stored on a real edge.
    pub const ANY: EdgeType = EdgeType(-1);
    /// Type used by the untyped `(from, to)` operations.
    pub const DEFAULT: EdgeType = EdgeType(0);

    /// True for the wildcard value.
    #[inline]
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    /// Whether an edge of type `actual` passes this filter.
    #[inline]
    pub fn matches(self, actual: EdgeType) -> bool {
        self.is_any() || self == actual
    }
}

impl Default for EdgeType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "*")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// 16-bit vertex type tag, same conventions as [`EdgeType`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexType(pub i16);

impl VertexType {
    /// Wildcard filter. Never assigned to a vertex.
    pub const ANY: VertexType = VertexType(-1);
    /// Type of vertices never tagged.
    pub const DEFAULT: VertexType = VertexType(0);

    /// True for the wildcard value.
    #[inline]
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    /// Whether a vertex of type `actual` passes this filter.
    #[inline]
    pub fn matches(self, actual: VertexType) -> bool {
        self.is_any() || self == actual
    }
}

impl Default for VertexType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which adjacency list of a vertex is consulted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Out-neighbours: `v -> n`.
    Forward,
    /// In-neighbours: `n -> v`.
    Backward,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// One of the simultaneously queryable views of a [`crate::storage::VersionedGraph`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GraphVersion {
    /// Last committed state (OLD in delta terms).
    Permanent,
    /// Edges added since the last commit.
    DiffPlus,
    /// Edges removed since the last commit.
    DiffMinus,
    /// Permanent state with pending edits applied (LATEST in delta terms).
    Merged,
}

impl GraphVersion {
    /// Diff logs are enumerable but cannot be looked up by vertex.
    #[inline]
    pub fn is_indexable(self) -> bool {
        matches!(self, GraphVersion::Permanent | GraphVersion::Merged)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            GraphVersion::Permanent => "permanent",
            GraphVersion::DiffPlus => "diff_plus",
            GraphVersion::DiffMinus => "diff_minus",
            GraphVersion::Merged => "merged",
        }
    }
}

/// A directed, typed edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source vertex.
    pub from: VertexId,
    /// Destination vertex.
    pub to: VertexId,
    /// Edge type.
    #[serde(default)]
    pub ty: EdgeType,
}

impl Edge {
    /// Creates a typed edge.
    pub fn new(from: VertexId, to: VertexId, ty: EdgeType) -> Self {
        Self { from, to, ty }
    }

    /// Edge carrying [`EdgeType::DEFAULT`].
    pub fn untyped(from: u32, to: u32) -> Self {
        Self::new(VertexId(from), VertexId(to), EdgeType::DEFAULT)
    }
}

/// A (partial) match: one vertex per query variable, in plan order.
pub type Tuple = Vec<VertexId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_every_type() {
        assert!(EdgeType::ANY.matches(EdgeType(7)));
        assert!(EdgeType(7).matches(EdgeType(7)));
        assert!(!EdgeType(7).matches(EdgeType(8)));
        assert!(VertexType::ANY.matches(VertexType::DEFAULT));
    }

    #[test]
    fn only_permanent_and_merged_are_indexable() {
        assert!(GraphVersion::Permanent.is_indexable());
        assert!(GraphVersion::Merged.is_indexable());
        assert!(!GraphVersion::DiffPlus.is_indexable());
        assert!(!GraphVersion::DiffMinus.is_indexable());
    }
}
