//! Staging area for snapshots whose parent has not arrived yet.

use std::collections::HashMap;

use crate::identifier::Identifier;
use crate::node::NodeSnapshot;

/// Snapshots keyed by the missing parent they wait on.
///
/// Keys are never present in the owning registry: the sequence drains a key
/// as soon as its parent is integrated.
#[derive(Debug, Clone)]
pub(crate) struct OrphanBuffer<T> {
    waiting: HashMap<Identifier, Vec<NodeSnapshot<T>>>,
    len: usize,
}

impl<T> OrphanBuffer<T> {
    pub(crate) fn new() -> Self {
        Self {
            waiting: HashMap::new(),
            len: 0,
        }
    }

    /// Total number of buffered snapshots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns true if something is waiting on `parent`.
    pub(crate) fn is_waiting_on(&self, parent: &Identifier) -> bool {
        self.waiting.contains_key(parent)
    }

    /// Buffers a snapshot under its parent.
    ///
    /// A repeated delivery of an already buffered id is coalesced: the
    /// tombstone flags are OR-ed and no second entry is kept. Returns true if
    /// a new entry was added.
    pub(crate) fn push(&mut self, snapshot: NodeSnapshot<T>) -> bool {
        let siblings = self.waiting.entry(snapshot.parent_id.clone()).or_default();
        if let Some(existing) = siblings.iter_mut().find(|s| s.id == snapshot.id) {
            existing.deleted |= snapshot.deleted;
            return false;
        }
        siblings.push(snapshot);
        self.len += 1;
        true
    }

    /// Removes and returns everything waiting on `parent`.
    pub(crate) fn take(&mut self, parent: &Identifier) -> Vec<NodeSnapshot<T>> {
        let children = self.waiting.remove(parent).unwrap_or_default();
        self.len -= children.len();
        children
    }

    /// Iterates over every buffered snapshot.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &NodeSnapshot<T>> {
        self.waiting.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(ts: u64, parent: &Identifier) -> NodeSnapshot<char> {
        NodeSnapshot::new(Identifier::new(ts, "server"), parent.clone(), 'c')
    }

    #[test]
    fn push_and_take() {
        let parent = Identifier::new(10, "server");
        let mut buffer = OrphanBuffer::new();
        assert!(buffer.push(child(11, &parent)));
        assert!(buffer.push(child(12, &parent)));
        assert_eq!(buffer.len(), 2);
        assert!(buffer.is_waiting_on(&parent));

        let drained = buffer.take(&parent);
        assert_eq!(drained.len(), 2);
        assert_eq!(buffer.len(), 0);
        assert!(!buffer.is_waiting_on(&parent));
    }

    #[test]
    fn take_missing_key_is_empty() {
        let mut buffer: OrphanBuffer<char> = OrphanBuffer::new();
        assert!(buffer.take(&Identifier::new(1, "x")).is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn duplicate_delivery_is_coalesced() {
        let parent = Identifier::new(10, "server");
        let mut buffer = OrphanBuffer::new();
        assert!(buffer.push(child(11, &parent)));
        assert!(!buffer.push(child(11, &parent).tombstoned()));
        assert!(!buffer.push(child(11, &parent)));
        assert_eq!(buffer.len(), 1);

        let drained = buffer.take(&parent);
        assert_eq!(drained.len(), 1);
        assert!(drained[0].deleted, "tombstone must survive coalescing");
    }

    #[test]
    fn iter_visits_all_keys() {
        let p1 = Identifier::new(10, "a");
        let p2 = Identifier::new(20, "b");
        let mut buffer = OrphanBuffer::new();
        buffer.push(child(11, &p1));
        buffer.push(child(21, &p2));
        assert_eq!(buffer.iter().count(), 2);
    }
}
