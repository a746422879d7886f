use std::cmp::Ordering;

use crate::types::{EdgeType, GraphError, Result, VertexId};

const MIN_CAPACITY: usize = 2;
const GROWTH_FACTOR: f64 = 1.2;

/// Neighbours of one vertex in one direction, co-sorted by `(neighbour, type)`.
///
/// A vertex pair may appear several times as long as the edge types differ.
/// The list never deduplicates on its own; callers decide whether an edge is
/// already present before calling [`SortedAdjacencyList::add`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortedAdjacencyList {
    neighbour_ids: Vec<VertexId>,
    edge_types: Vec<EdgeType>,
}

impl SortedAdjacencyList {
    /// Creates an empty list without allocating.
    pub const fn new() -> Self {
        Self {
            neighbour_ids: Vec::new(),
            edge_types: Vec::new(),
        }
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            neighbour_ids: Vec::with_capacity(capacity),
            edge_types: Vec::with_capacity(capacity),
        }
    }

    /// Number of typed entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbour_ids.len()
    }

    /// Returns `true` when the list has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbour_ids.is_empty()
    }

    /// Entries the list can hold before growing.
    pub fn capacity(&self) -> usize {
        self.neighbour_ids.capacity().min(self.edge_types.capacity())
    }

    /// Sorted neighbour ids, including one entry per typed edge.
    pub fn neighbour_ids(&self) -> &[VertexId] {
        &self.neighbour_ids
    }

    /// Neighbour id at `index`.
    pub fn neighbour_id(&self, index: usize) -> Result<VertexId> {
        self.neighbour_ids
            .get(index)
            .copied()
            .ok_or(GraphError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    /// Edge type at `index`.
    pub fn edge_type(&self, index: usize) -> Result<EdgeType> {
        self.edge_types
            .get(index)
            .copied()
            .ok_or(GraphError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    /// Entries as `(neighbour, type)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, EdgeType)> + '_ {
        self.neighbour_ids
            .iter()
            .copied()
            .zip(self.edge_types.iter().copied())
    }

    /// Inserts `(neighbour, ty)` at its sorted position.
    ///
    /// Appending past the current maximum costs O(1); otherwise entries are
    /// shifted right one slot at a time until the new key fits.
    pub fn add(&mut self, neighbour: VertexId, ty: EdgeType) {
        self.ensure_capacity();
        self.neighbour_ids.push(neighbour);
        self.edge_types.push(ty);
        let key = (neighbour, ty);
        let mut pos = self.len() - 1;
        while pos > 0 && self.key(pos - 1) > key {
            self.neighbour_ids[pos] = self.neighbour_ids[pos - 1];
            self.edge_types[pos] = self.edge_types[pos - 1];
            pos -= 1;
        }
        self.neighbour_ids[pos] = neighbour;
        self.edge_types[pos] = ty;
    }

    /// Removes one `(neighbour, ty)` entry. Returns false when absent.
    pub fn remove_neighbour(&mut self, neighbour: VertexId, ty: EdgeType) -> bool {
        let key = (neighbour, ty);
        let pos = self.lower_bound(key);
        if pos < self.len() && self.key(pos) == key {
            self.neighbour_ids.remove(pos);
            self.edge_types.remove(pos);
            true
        } else {
            false
        }
    }

    /// Scans forward from `start` for `neighbour` with a type passing `filter`.
    ///
    /// Stops at the first larger neighbour id. Not a binary search: ties on
    /// the neighbour id have to be walked to check their types.
    pub fn search(&self, neighbour: VertexId, filter: EdgeType, start: usize) -> Option<usize> {
        self.seek(neighbour, filter, start).ok()
    }

    /// Whether an entry for `neighbour` passes `filter`.
    pub fn contains(&self, neighbour: VertexId, filter: EdgeType) -> bool {
        let start = self.lower_bound((neighbour, EdgeType(i16::MIN)));
        self.search(neighbour, filter, start).is_some()
    }

    /// Neighbour ids whose edge type passes `filter`, each id at most once.
    pub fn filtered_neighbour_ids(&self, filter: EdgeType) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = Vec::with_capacity(self.len());
        for (id, ty) in self.iter() {
            if filter.matches(ty) && out.last() != Some(&id) {
                out.push(id);
            }
        }
        out
    }

    /// Keeps the candidates that are neighbours in this list under `filter`.
    ///
    /// `candidates` must be sorted ascending. The scan cursor only moves
    /// forward, so one pass costs O(len + candidates.len()).
    pub fn intersection(&self, candidates: &[VertexId], filter: EdgeType) -> Vec<VertexId> {
        let mut out = Vec::with_capacity(candidates.len().min(self.len()));
        let mut cursor = 0;
        for &candidate in candidates {
            if cursor >= self.len() {
                break;
            }
            match self.seek(candidate, filter, cursor) {
                Ok(found) => {
                    out.push(candidate);
                    cursor = found;
                }
                Err(stop) => cursor = stop,
            }
        }
        out
    }

    /// `Ok(index)` on a hit, `Err(index)` of the first entry past `neighbour`.
    fn seek(
        &self,
        neighbour: VertexId,
        filter: EdgeType,
        start: usize,
    ) -> std::result::Result<usize, usize> {
        let mut i = start;
        while i < self.len() {
            match self.neighbour_ids[i].cmp(&neighbour) {
                Ordering::Less => i += 1,
                Ordering::Equal => {
                    if filter.matches(self.edge_types[i]) {
                        return Ok(i);
                    }
                    i += 1;
                }
                Ordering::Greater => return Err(i),
            }
        }
        Err(self.len())
    }

    fn lower_bound(&self, key: (VertexId, EdgeType)) -> usize {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key(mid) < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Unchecked `(neighbour, type)` at `index`.
    #[inline]
    pub(crate) fn entry(&self, index: usize) -> (VertexId, EdgeType) {
        self.key(index)
    }

    #[inline]
    fn key(&self, index: usize) -> (VertexId, EdgeType) {
        (self.neighbour_ids[index], self.edge_types[index])
    }

    fn ensure_capacity(&mut self) {
        let len = self.len();
        let capacity = self.capacity();
        if len < capacity {
            return;
        }
        let grown = ((capacity as f64) * GROWTH_FACTOR).ceil() as usize;
        let target = grown.max(MIN_CAPACITY).max(len + 1);
        self.neighbour_ids.reserve_exact(target - len);
        self.edge_types.reserve_exact(target - len);
    }

    #[cfg(test)]
    pub(crate) fn is_sorted(&self) -> bool {
        (1..self.len()).all(|i| self.key(i - 1) <= self.key(i))
    }
}

impl FromIterator<(VertexId, EdgeType)> for SortedAdjacencyList {
    fn from_iter<I: IntoIterator<Item = (VertexId, EdgeType)>>(iter: I) -> Self {
        let mut list = SortedAdjacencyList::new();
        for (id, ty) in iter {
            list.add(id, ty);
        }
        list
    }
}
