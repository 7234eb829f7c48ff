//! Positive-Negative Counter CRDT.
//!
//! A PN-Counter supports both increment and decrement by pairing two
//! grow-only counters: one for increments and one for decrements. The value is
//! `sum(increments) - sum(decrements)`. The representation only ever grows,
//! even when the observed value goes down.
//!
//! Merge joins each half independently; the pair is the product lattice.

use convergent_types::ReplicaId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::trace;

use crate::crdt::{downcast, Crdt, CrdtKind, CrdtValue};
use crate::error::Result;
use crate::g_counter::GCounterState;

/// The mergeable state of a PN-Counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNCounterState {
    increments: GCounterState,
    decrements: GCounterState,
}

impl PNCounterState {
    /// Creates a state with value 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `amount` increments by `replica_id`.
    pub fn increment(&mut self, replica_id: &ReplicaId, amount: u64) {
        self.increments.increment(replica_id, amount);
    }

    /// Records `amount` decrements by `replica_id`.
    pub fn decrement(&mut self, replica_id: &ReplicaId, amount: u64) {
        self.decrements.increment(replica_id, amount);
    }

    /// Returns the current value (may be negative), clamped to `i64`.
    #[must_use]
    pub fn value(&self) -> i64 {
        let diff = i128::from(self.increments.value()) - i128::from(self.decrements.value());
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }

    /// The increments half.
    #[must_use]
    pub fn increments(&self) -> &GCounterState {
        &self.increments
    }

    /// The decrements half.
    #[must_use]
    pub fn decrements(&self) -> &GCounterState {
        &self.decrements
    }

    /// Merges another state into this one.
    pub fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }

    /// Returns a new state that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

/// A PN-Counter replica.
#[derive(Debug)]
pub struct PNCounter {
    replica_id: ReplicaId,
    state: RwLock<PNCounterState>,
}

impl PNCounter {
    /// Creates a zero counter owned by `replica_id`.
    #[must_use]
    pub fn new(replica_id: impl Into<ReplicaId>) -> Self {
        Self {
            replica_id: replica_id.into(),
            state: RwLock::new(PNCounterState::new()),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Adds one.
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Subtracts one.
    pub fn decrement(&self) {
        self.decrement_by(1);
    }

    /// Adds `amount`.
    pub fn increment_by(&self, amount: u64) {
        self.state.write().increment(&self.replica_id, amount);
    }

    /// Subtracts `amount`.
    pub fn decrement_by(&self, amount: u64) {
        self.state.write().decrement(&self.replica_id, amount);
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.state.read().value()
    }

    /// Copies the current state out.
    #[must_use]
    pub fn snapshot(&self) -> PNCounterState {
        self.state.read().clone()
    }

    /// Merges a received state into this replica.
    pub fn merge_state(&self, incoming: &PNCounterState) {
        self.state.write().merge(incoming);
        trace!(replica = %self.replica_id, "merged pn-counter state");
    }

    /// Merges another replica into this one (see [`GCounter::merge`] for the
    /// locking discipline).
    ///
    /// [`GCounter::merge`]: crate::GCounter::merge
    pub fn merge(&self, other: &Self) {
        let incoming = other.snapshot();
        self.merge_state(&incoming);
    }
}

impl<T> Crdt<T> for PNCounter {
    fn kind(&self) -> CrdtKind {
        CrdtKind::PNCounter
    }

    fn value(&self) -> CrdtValue<T> {
        CrdtValue::Counter(PNCounter::value(self))
    }

    fn merge(&self, other: &dyn Crdt<T>) -> Result<()> {
        let other = downcast::<Self, T>(CrdtKind::PNCounter, other)?;
        PNCounter::merge(self, other);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
