//! Replicated Growable Array (RGA) for sequences.
//!
//! Every element is a node hanging off the node it was inserted after (its
//! parent). The visible sequence is a pre-order walk of that tree in which
//! siblings appear in descending [`Identifier`] order. The walk is not
//! recomputed on read: integration keeps a linked traversal order up to date,
//! and reads just follow the links.
//!
//! Replicas exchange [`NodeSnapshot`]s. A snapshot whose parent is not known
//! yet is parked in an orphan buffer and integrated as soon as the parent
//! arrives, so a child never becomes visible before its parent. Deletion only
//! sets a tombstone flag, which merges by logical OR.

use convergent_types::{LamportClock, ReplicaId};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::crdt::{downcast, Crdt, CrdtKind, CrdtValue};
use crate::error::{CrdtError, Result};
use crate::identifier::Identifier;
use crate::node::{Node, NodeSnapshot};
use crate::orphans::OrphanBuffer;
use crate::registry::{NodeIndex, Registry};

/// Configuration for a sequence replica.
#[derive(Debug, Clone)]
pub struct RgaConfig {
    /// Number of buffered orphans above which a merge logs a warning.
    /// Orphans are never dropped regardless of this value.
    pub orphan_warn_threshold: usize,
}

impl Default for RgaConfig {
    fn default() -> Self {
        Self {
            orphan_warn_threshold: 1024,
        }
    }
}

#[derive(Debug, Clone)]
struct RgaState<T> {
    clock: LamportClock,
    registry: Registry<T>,
    orphans: OrphanBuffer<T>,
}

/// A Replicated Growable Array replica.
///
/// All operations take the replica's lock: reads share it, mutations hold it
/// exclusively for their whole duration.
#[derive(Debug)]
pub struct Rga<T> {
    replica_id: ReplicaId,
    config: RgaConfig,
    state: RwLock<RgaState<T>>,
}

impl<T: Clone> Rga<T> {
    /// Creates an empty sequence holding only the root sentinel.
    #[must_use]
    pub fn new(replica_id: impl Into<ReplicaId>) -> Self {
        Self::with_config(replica_id, RgaConfig::default())
    }

    /// Creates an empty sequence with a custom configuration.
    #[must_use]
    pub fn with_config(replica_id: impl Into<ReplicaId>, config: RgaConfig) -> Self {
        Self {
            replica_id: replica_id.into(),
            config,
            state: RwLock::new(RgaState {
                clock: LamportClock::new(),
                registry: Registry::new(),
                orphans: OrphanBuffer::new(),
            }),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RgaConfig {
        &self.config
    }

    /// Inserts `value` immediately after `parent_id`.
    ///
    /// Returns the new element's identifier. Fails with
    /// [`CrdtError::UnknownParent`] if `parent_id` is not in the local
    /// registry, or [`CrdtError::ClockExhausted`] once the clock has reached
    /// `u64::MAX`. A failed insert changes nothing, not even the clock.
    pub fn insert(&self, value: T, parent_id: &Identifier) -> Result<Identifier> {
        let mut state = self.state.write();
        let Some(parent) = state.registry.lookup(parent_id) else {
            debug!(replica = %self.replica_id, %parent_id, "insert rejected: unknown parent");
            return Err(CrdtError::UnknownParent(parent_id.clone()));
        };

        let Some(timestamp) = state.clock.tick() else {
            warn!(replica = %self.replica_id, "insert rejected: clock exhausted");
            return Err(CrdtError::ClockExhausted);
        };

        let id = Identifier::new(timestamp, self.replica_id.clone());
        state.integrate(parent, NodeSnapshot::new(id.clone(), parent_id.clone(), value));
        Ok(id)
    }

    /// Marks an element deleted.
    ///
    /// Unknown identifiers (possibly not yet merged) and the root are ignored.
    /// The element stays addressable as a parent.
    pub fn delete(&self, id: &Identifier) {
        if id.is_root() {
            return;
        }
        if let Some(node) = self.state.write().registry.get_mut(id) {
            node.deleted = true;
        }
    }

    /// Merges a batch of snapshots from another replica.
    ///
    /// Known ids only propagate tombstones; ids whose parent is missing are
    /// buffered until it arrives. Neither case is an error.
    pub fn merge_nodes<I>(&self, batch: I)
    where
        I: IntoIterator<Item = NodeSnapshot<T>>,
    {
        let mut state = self.state.write();
        for snapshot in batch {
            state.apply(snapshot);
        }

        let buffered = state.orphans.len();
        if buffered > self.config.orphan_warn_threshold {
            warn!(
                replica = %self.replica_id,
                buffered,
                threshold = self.config.orphan_warn_threshold,
                "orphan buffer above threshold; parents may be missing"
            );
        }
    }

    /// Merges another replica into this one.
    ///
    /// The other replica is snapshotted under its own read lock, which is
    /// released before this replica's write lock is taken. No two instance
    /// locks are ever held together, so concurrent merges in both directions
    /// cannot deadlock and merging a replica into itself is safe.
    pub fn merge(&self, other: &Self) {
        let batch = other.snapshot();
        self.merge_nodes(batch);
    }

    /// Returns the visible elements in order.
    #[must_use]
    pub fn value(&self) -> Vec<T> {
        let state = self.state.read();
        state
            .registry
            .linked()
            .filter(|node| node.is_visible())
            .filter_map(|node| node.value.clone())
            .collect()
    }

    /// Returns every node this replica knows, as snapshots.
    ///
    /// Integrated nodes come first in traversal order (so parents precede
    /// children), followed by buffered orphans. Tombstones are included.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NodeSnapshot<T>> {
        let state = self.state.read();
        state
            .registry
            .linked()
            .filter_map(Node::to_snapshot)
            .chain(state.orphans.iter().cloned())
            .collect()
    }

    /// Creates a new replica named `replica_id` starting from this state.
    #[must_use]
    pub fn fork(&self, replica_id: impl Into<ReplicaId>) -> Self {
        Self {
            replica_id: replica_id.into(),
            config: self.config.clone(),
            state: RwLock::new(self.state.read().clone()),
        }
    }
}

impl<T> Rga<T> {
    /// Identifiers of the visible elements, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<Identifier> {
        let state = self.state.read();
        state
            .registry
            .linked()
            .filter(|node| node.is_visible())
            .map(|node| node.id.clone())
            .collect()
    }

    /// Identifier of the visible element at `index`.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<Identifier> {
        let state = self.state.read();
        state
            .registry
            .linked()
            .filter(|node| node.is_visible())
            .nth(index)
            .map(|node| node.id.clone())
    }

    /// Number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.registry.linked().filter(|node| node.is_visible()).count()
    }

    /// Returns true if no element is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `id` is in the registry (tombstoned or not).
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.state.read().registry.contains(id)
    }

    /// Returns true if `id` is in the registry and tombstoned.
    #[must_use]
    pub fn is_deleted(&self, id: &Identifier) -> bool {
        self.state
            .read()
            .registry
            .get(id)
            .is_some_and(|node| node.deleted)
    }

    /// Number of registry entries, including the root and tombstones.
    #[must_use]
    pub fn registry_len(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Number of snapshots buffered while waiting on a parent.
    #[must_use]
    pub fn pending_orphans(&self) -> usize {
        self.state.read().orphans.len()
    }

    /// Returns true if some buffered snapshot waits on `parent_id`.
    #[must_use]
    pub fn is_waiting_on(&self, parent_id: &Identifier) -> bool {
        self.state.read().orphans.is_waiting_on(parent_id)
    }

    /// Current Lamport time.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.state.read().clock.current()
    }
}

impl Rga<char> {
    /// Returns the visible text.
    #[must_use]
    pub fn text(&self) -> String {
        self.value().into_iter().collect()
    }

    /// Inserts `s` after `parent_id`, each character after the previous one.
    ///
    /// Returns the new identifiers in order. Fails without changes if
    /// `parent_id` is unknown.
    pub fn insert_str(&self, parent_id: &Identifier, s: &str) -> Result<Vec<Identifier>> {
        let mut ids = Vec::with_capacity(s.len());
        let mut anchor = parent_id.clone();
        for c in s.chars() {
            anchor = self.insert(c, &anchor)?;
            ids.push(anchor.clone());
        }
        Ok(ids)
    }
}

impl<T> RgaState<T> {
    /// Processes one remote snapshot and everything it unblocks.
    ///
    /// Buffered children are drained through an explicit work-list so long
    /// causal chains do not grow the call stack.
    fn apply(&mut self, snapshot: NodeSnapshot<T>) {
        let mut work = vec![snapshot];
        while let Some(snapshot) = work.pop() {
            if let Some(existing) = self.registry.get_mut(&snapshot.id) {
                if snapshot.deleted && !existing.deleted && !existing.id.is_root() {
                    trace!(id = %existing.id, "propagating tombstone");
                    existing.deleted = true;
                }
                continue;
            }

            match self.registry.lookup(&snapshot.parent_id) {
                Some(parent) => {
                    let id = snapshot.id.clone();
                    self.integrate(parent, snapshot);

                    let children = self.orphans.take(&id);
                    if !children.is_empty() {
                        debug!(parent = %id, count = children.len(), "draining orphans");
                        work.extend(children);
                    }
                }
                None => {
                    let id = snapshot.id.clone();
                    let parent = snapshot.parent_id.clone();
                    if self.orphans.push(snapshot) {
                        debug!(%id, %parent, "parent missing; buffering");
                    } else {
                        trace!(%id, %parent, "coalesced duplicate orphan");
                    }
                }
            }
        }
    }

    /// Links a node whose parent is present into traversal order.
    fn integrate(&mut self, parent: NodeIndex, snapshot: NodeSnapshot<T>) {
        let (prev, next) = self.position_for(parent, &snapshot.parent_id, &snapshot.id);
        self.clock.observe(snapshot.id.timestamp);
        trace!(id = %snapshot.id, parent = %snapshot.parent_id, "integrating node");

        let idx = self.registry.push(Node::from_snapshot(snapshot, next));
        self.registry.node_mut(prev).next = Some(idx);
    }

    /// Finds the link `(prev, next)` the new node `id` goes between.
    ///
    /// Scans forward from the parent over its existing children. Each child
    /// that outranks `id` is passed together with its whole subtree, which is
    /// contiguous in traversal order. The scan stops at the first child `id`
    /// outranks or the first node outside the parent's subtree.
    fn position_for(
        &self,
        parent: NodeIndex,
        parent_id: &Identifier,
        id: &Identifier,
    ) -> (NodeIndex, Option<NodeIndex>) {
        let mut passed: HashSet<&Identifier> = HashSet::new();
        let mut prev = parent;
        let mut cursor = self.registry.node(parent).next;

        while let Some(current) = cursor {
            let node = self.registry.node(current);
            let Some(node_parent) = node.parent_id.as_ref() else {
                break;
            };

            if node_parent == parent_id {
                if id.greater(&node.id) {
                    break;
                }
            } else if !passed.contains(node_parent) {
                break;
            }

            passed.insert(&node.id);
            prev = current;
            cursor = node.next;
        }

        (prev, cursor)
    }
}

impl<T: Clone + 'static> Crdt<T> for Rga<T> {
    fn kind(&self) -> CrdtKind {
        CrdtKind::Sequence
    }

    fn value(&self) -> CrdtValue<T> {
        CrdtValue::Sequence(Rga::value(self))
    }

    fn merge(&self, other: &dyn Crdt<T>) -> Result<()> {
        let other = downcast::<Self, T>(CrdtKind::Sequence, other)?;
        Rga::merge(self, other);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
