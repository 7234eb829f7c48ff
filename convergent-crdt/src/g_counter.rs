//! Grow-only Counter CRDT.
//!
//! Each replica owns one slot in a map of counts and only ever bumps its own
//! slot. The value is the sum of all slots; merge takes the per-slot maximum,
//! which is the join of this semilattice.

use convergent_types::ReplicaId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use tracing::trace;

use crate::crdt::{downcast, Crdt, CrdtKind, CrdtValue};
use crate::error::Result;

/// The mergeable state of a grow-only counter.
///
/// Unseen replicas count as zero, so a missing slot and a zero slot compare
/// equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GCounterState {
    slots: BTreeMap<ReplicaId, u64>,
}

impl GCounterState {
    /// Creates an all-zero state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to one replica's slot.
    pub fn increment(&mut self, replica_id: &ReplicaId, amount: u64) {
        let slot = self.slots.entry(replica_id.clone()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Returns one replica's count.
    #[must_use]
    pub fn get(&self, replica_id: &ReplicaId) -> u64 {
        self.slots.get(replica_id).copied().unwrap_or(0)
    }

    /// Sum over all slots.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.slots
            .values()
            .fold(0u64, |acc, &count| acc.saturating_add(count))
    }

    /// Iterates over `(replica, count)` slots in replica order.
    pub fn slots(&self) -> impl Iterator<Item = (&ReplicaId, u64)> {
        self.slots.iter().map(|(id, &count)| (id, count))
    }

    /// Merges another state into this one (per-slot max).
    pub fn merge(&mut self, other: &Self) {
        for (replica_id, &count) in &other.slots {
            let slot = self.slots.entry(replica_id.clone()).or_insert(0);
            *slot = (*slot).max(count);
        }
    }

    /// Returns a new state that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

impl PartialEq for GCounterState {
    fn eq(&self, other: &Self) -> bool {
        self.slots
            .keys()
            .chain(other.slots.keys())
            .all(|id| self.get(id) == other.get(id))
    }
}

impl Eq for GCounterState {}

/// A grow-only counter replica.
///
/// Shared by reference across threads; every operation takes the internal
/// lock for its duration.
#[derive(Debug)]
pub struct GCounter {
    replica_id: ReplicaId,
    state: RwLock<GCounterState>,
}

impl GCounter {
    /// Creates a zero counter owned by `replica_id`.
    #[must_use]
    pub fn new(replica_id: impl Into<ReplicaId>) -> Self {
        Self {
            replica_id: replica_id.into(),
            state: RwLock::new(GCounterState::new()),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Adds one to this replica's slot.
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Adds `amount` to this replica's slot.
    pub fn increment_by(&self, amount: u64) {
        self.state.write().increment(&self.replica_id, amount);
    }

    /// Sum over all known replicas.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.state.read().value()
    }

    /// Count contributed by one replica, as far as this replica knows.
    #[must_use]
    pub fn count_for(&self, replica_id: &ReplicaId) -> u64 {
        self.state.read().get(replica_id)
    }

    /// Copies the current state out, e.g. for shipping to another replica.
    #[must_use]
    pub fn snapshot(&self) -> GCounterState {
        self.state.read().clone()
    }

    /// Merges a received state into this replica.
    pub fn merge_state(&self, incoming: &GCounterState) {
        self.state.write().merge(incoming);
        trace!(replica = %self.replica_id, "merged g-counter state");
    }

    /// Merges another replica into this one.
    ///
    /// The other replica's state is copied under its own read lock before
    /// this replica's write lock is taken, so no two locks are ever held
    /// together.
    pub fn merge(&self, other: &Self) {
        let incoming = other.snapshot();
        self.merge_state(&incoming);
    }
}

impl<T> Crdt<T> for GCounter {
    fn kind(&self) -> CrdtKind {
        CrdtKind::GCounter
    }

    fn value(&self) -> CrdtValue<T> {
        CrdtValue::Counter(i64::try_from(GCounter::value(self)).unwrap_or(i64::MAX))
    }

    fn merge(&self, other: &dyn Crdt<T>) -> Result<()> {
        let other = downcast::<Self, T>(CrdtKind::GCounter, other)?;
        GCounter::merge(self, other);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(name: &str) -> ReplicaId {
        ReplicaId::new(name)
    }

    #[test]
    fn new_counter_is_zero() {
        let c = GCounter::new("a");
        assert_eq!(c.value(), 0);
        assert_eq!(c.count_for(&replica("a")), 0);
    }

    #[test]
    fn increment_touches_own_slot_only() {
        let c = GCounter::new("a");
        c.increment();
        c.increment();
        assert_eq!(c.value(), 2);
        assert_eq!(c.count_for(&replica("a")), 2);
        assert_eq!(c.count_for(&replica("b")), 0);
    }

    #[test]
    fn merge_takes_max_per_slot() {
        let mut a = GCounterState::new();
        a.increment(&replica("x"), 5);
        let mut b = GCounterState::new();
        b.increment(&replica("x"), 3);
        b.increment(&replica("y"), 1);

        let merged = a.merged(&b);
        assert_eq!(merged.get(&replica("x")), 5);
        assert_eq!(merged.get(&replica("y")), 1);
        assert_eq!(merged.value(), 6);
    }

    #[test]
    fn state_merge_is_commutative_associative_idempotent() {
        let mut a = GCounterState::new();
        a.increment(&replica("a"), 2);
        let mut b = GCounterState::new();
        b.increment(&replica("b"), 4);
        let mut c = GCounterState::new();
        c.increment(&replica("a"), 1);
        c.increment(&replica("c"), 7);

        assert_eq!(a.merged(&b), b.merged(&a));
        assert_eq!(a.merged(&b).merged(&c), a.merged(&b.merged(&c)));
        assert_eq!(a.merged(&a), a);
    }

    #[test]
    fn zero_slot_equals_missing_slot() {
        let mut a = GCounterState::new();
        a.increment(&replica("a"), 0);
        assert_eq!(a, GCounterState::new());
    }

    #[test]
    fn value_saturates() {
        let mut s = GCounterState::new();
        s.increment(&replica("a"), u64::MAX);
        s.increment(&replica("b"), 10);
        assert_eq!(s.value(), u64::MAX);
    }

    #[test]
    fn self_merge_does_not_deadlock() {
        let c = GCounter::new("a");
        c.increment();
        c.merge(&c);
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut s = GCounterState::new();
        s.increment(&replica("node-a"), 2);
        s.increment(&replica("node-b"), 1);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"node-a":2,"node-b":1}"#);
        let parsed: GCounterState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
