//! Output sinks receiving completed matches.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{Result, Tuple};

/// Push interface for completed matches.
///
/// The engine never reads back from a sink; projection, property lookup and
/// durable output are the sink's business.
pub trait OutputSink {
    /// Receives one batch of completed tuples.
    fn append(&mut self, batch: Vec<Tuple>) -> Result<()>;
}

impl OutputSink for Vec<Tuple> {
    fn append(&mut self, mut batch: Vec<Tuple>) -> Result<()> {
        self.append(&mut batch);
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn append(&mut self, batch: Vec<Tuple>) -> Result<()> {
        (**self).append(batch)
    }
}

/// Counts matches without keeping them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountingSink {
    /// Tuples received.
    pub tuples: u64,
    /// Batches received.
    pub batches: u64,
}

impl OutputSink for CountingSink {
    fn append(&mut self, batch: Vec<Tuple>) -> Result<()> {
        self.tuples += batch.len() as u64;
        self.batches += 1;
        Ok(())
    }
}

/// Adapts a closure into an [`OutputSink`].
pub struct FnSink<F>(pub F);

impl<F> OutputSink for FnSink<F>
where
    F: FnMut(Vec<Tuple>) -> Result<()>,
{
    fn append(&mut self, batch: Vec<Tuple>) -> Result<()> {
        (self.0)(batch)
    }
}

/// Whether a match appeared or disappeared with the pending edit batch.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MatchChange {
    /// The match holds after the commit but not before.
    Emerged,
    /// The match held before the commit but not after.
    Deleted,
}

/// Push interface for incremental (delta) results.
pub trait DeltaSink {
    /// Receives one batch of changed tuples.
    fn append(&mut self, change: MatchChange, batch: Vec<Tuple>) -> Result<()>;
}

impl<S: DeltaSink + ?Sized> DeltaSink for &mut S {
    fn append(&mut self, change: MatchChange, batch: Vec<Tuple>) -> Result<()> {
        (**self).append(change, batch)
    }
}

impl<S: DeltaSink + ?Sized> DeltaSink for Box<S> {
    fn append(&mut self, change: MatchChange, batch: Vec<Tuple>) -> Result<()> {
        (**self).append(change, batch)
    }
}

/// Lets a subscriber keep a handle on results delivered to a registry.
impl<S: DeltaSink + ?Sized> DeltaSink for Arc<Mutex<S>> {
    fn append(&mut self, change: MatchChange, batch: Vec<Tuple>) -> Result<()> {
        self.lock().append(change, batch)
    }
}

/// Collects emerged and deleted matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaMatches {
    /// Matches that appeared.
    pub emerged: Vec<Tuple>,
    /// Matches that disappeared.
    pub deleted: Vec<Tuple>,
}

impl DeltaMatches {
    /// Returns `true` when nothing changed.
    pub fn is_empty(&self) -> bool {
        self.emerged.is_empty() && self.deleted.is_empty()
    }

    /// Forgets every collected change.
    pub fn clear(&mut self) {
        self.emerged.clear();
        self.deleted.clear();
    }
}

impl DeltaSink for DeltaMatches {
    fn append(&mut self, change: MatchChange, mut batch: Vec<Tuple>) -> Result<()> {
        match change {
            MatchChange::Emerged => self.emerged.append(&mut batch),
            MatchChange::Deleted => self.deleted.append(&mut batch),
        }
        Ok(())
    }
}
