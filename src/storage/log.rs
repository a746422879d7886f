//! Pending edge logs.

use std::iter::Flatten;
use std::slice;

use rustc_hash::FxHashMap;

use crate::types::Edge;

// Below this many slots tombstones are left in place.
const COMPACT_MIN_SLOTS: usize = 64;

/// Edit-ordered set of pending edges.
///
/// A position index makes membership tests and cancellation O(1): removal
/// leaves a tombstone, and tombstones are compacted away once they outnumber
/// live entries, so every operation is amortized constant time.
#[derive(Clone, Debug, Default)]
pub struct EdgeLog {
    slots: Vec<Option<Edge>>,
    positions: FxHashMap<Edge, usize>,
}

impl EdgeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live edges.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` when no edge is pending.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns `true` if `edge` is in the log.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.positions.contains_key(edge)
    }

    /// Live edges in the order they were logged.
    pub fn iter(&self) -> EdgeLogIter<'_> {
        EdgeLogIter(self.slots.iter().flatten())
    }

    /// Copies the live edges out in log order.
    pub fn to_vec(&self) -> Vec<Edge> {
        self.iter().copied().collect()
    }

    /// Appends `edge`. Returns `false` if it was already logged.
    pub(crate) fn push(&mut self, edge: Edge) -> bool {
        if self.positions.contains_key(&edge) {
            return false;
        }
        self.positions.insert(edge, self.slots.len());
        self.slots.push(Some(edge));
        true
    }

    /// Removes `edge`. Returns `false` if it was not logged.
    pub(crate) fn remove(&mut self, edge: &Edge) -> bool {
        let Some(pos) = self.positions.remove(edge) else {
            return false;
        };
        self.slots[pos] = None;
        if self.slots.len() >= COMPACT_MIN_SLOTS && self.slots.len() > 2 * self.positions.len() {
            self.compact();
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(edge) = slot {
                self.positions.insert(*edge, pos);
            }
        }
    }
}

/// Iterator over the live edges of an [`EdgeLog`].
pub struct EdgeLogIter<'a>(Flatten<slice::Iter<'a, Option<Edge>>>);

impl<'a> Iterator for EdgeLogIter<'a> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<'a> IntoIterator for &'a EdgeLog {
    type Item = &'a Edge;
    type IntoIter = EdgeLogIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(from: u32, to: u32) -> Edge {
        Edge::untyped(from, to)
    }

    #[test]
    fn removal_keeps_log_order() {
        let mut log = EdgeLog::new();
        for i in 0..5 {
            assert!(log.push(e(i, i + 1)));
        }
        assert!(!log.push(e(2, 3)));
        assert!(log.remove(&e(1, 2)));
        assert!(!log.remove(&e(1, 2)));
        assert!(log.push(e(1, 2)));
        assert_eq!(log.to_vec(), vec![e(0, 1), e(2, 3), e(3, 4), e(4, 5), e(1, 2)]);
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn compaction_preserves_positions() {
        let mut log = EdgeLog::new();
        for i in 0..200 {
            log.push(e(i, i + 1));
        }
        for i in (0..200).filter(|i| i % 4 != 0) {
            assert!(log.remove(&e(i, i + 1)));
        }
        assert!(log.slots.len() < 200);
        let expected: Vec<Edge> = (0..200).step_by(4).map(|i| e(i, i + 1)).collect();
        assert_eq!(log.to_vec(), expected);
        for edge in &expected {
            assert!(log.contains(edge));
        }
        for edge in expected.iter().rev() {
            assert!(log.remove(edge));
        }
        assert!(log.is_empty());
        assert_eq!(log.iter().count(), 0);
    }

    #[test]
    fn tombstones_stay_bounded() {
        let mut log = EdgeLog::new();
        for round in 0..50u32 {
            for i in 0..100 {
                log.push(e(i, round));
            }
            for i in 0..100 {
                log.remove(&e(i, round));
                assert!(log.slots.len() <= 2 * log.len() + COMPACT_MIN_SLOTS);
            }
        }
        assert!(log.is_empty());
    }
}
