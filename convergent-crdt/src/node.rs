//! Sequence nodes and the snapshots replicas exchange.

use convergent_types::ReplicaId;
use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;
use crate::registry::NodeIndex;

/// An element of the sequence as stored in the registry.
///
/// `next` is the traversal link maintained by integration, not the tree
/// edge; the tree edge is `parent_id`.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) id: Identifier,
    /// `None` only for the root sentinel.
    pub(crate) parent_id: Option<Identifier>,
    /// `None` only for the root sentinel.
    pub(crate) value: Option<T>,
    pub(crate) deleted: bool,
    pub(crate) next: Option<NodeIndex>,
}

impl<T> Node<T> {
    pub(crate) fn root() -> Self {
        Self {
            id: Identifier::root(),
            parent_id: None,
            value: None,
            deleted: false,
            next: None,
        }
    }

    pub(crate) fn from_snapshot(snapshot: NodeSnapshot<T>, next: Option<NodeIndex>) -> Self {
        Self {
            id: snapshot.id,
            parent_id: Some(snapshot.parent_id),
            value: Some(snapshot.value),
            deleted: snapshot.deleted,
            next,
        }
    }

    /// Returns true if this node contributes to the visible value.
    pub(crate) fn is_visible(&self) -> bool {
        !self.deleted && self.value.is_some()
    }
}

impl<T: Clone> Node<T> {
    /// Copies the node out without its link. `None` for the root.
    pub(crate) fn to_snapshot(&self) -> Option<NodeSnapshot<T>> {
        Some(NodeSnapshot {
            id: self.id.clone(),
            parent_id: self.parent_id.clone()?,
            value: self.value.clone()?,
            deleted: self.deleted,
        })
    }
}

/// A node as shipped between replicas.
///
/// Carries no link: traversal order is always derived locally. On the wire it
/// is the flat record
/// `{timestamp, replica_id, parent_timestamp, parent_replica_id, value, deleted}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "WireNode<T>",
    into = "WireNode<T>",
    bound(
        serialize = "T: Serialize + Clone",
        deserialize = "T: Deserialize<'de>"
    )
)]
pub struct NodeSnapshot<T> {
    /// The node's identifier.
    pub id: Identifier,
    /// The node it was inserted after.
    pub parent_id: Identifier,
    /// The payload.
    pub value: T,
    /// Tombstone flag.
    pub deleted: bool,
}

impl<T> NodeSnapshot<T> {
    /// Creates a live (not deleted) snapshot.
    #[must_use]
    pub fn new(id: Identifier, parent_id: Identifier, value: T) -> Self {
        Self {
            id,
            parent_id,
            value,
            deleted: false,
        }
    }

    /// Returns the same snapshot marked deleted.
    #[must_use]
    pub fn tombstoned(mut self) -> Self {
        self.deleted = true;
        self
    }
}

#[derive(Serialize, Deserialize)]
struct WireNode<T> {
    timestamp: u64,
    replica_id: ReplicaId,
    parent_timestamp: u64,
    parent_replica_id: ReplicaId,
    value: T,
    #[serde(default)]
    deleted: bool,
}

impl<T> From<WireNode<T>> for NodeSnapshot<T> {
    fn from(wire: WireNode<T>) -> Self {
        Self {
            id: Identifier {
                timestamp: wire.timestamp,
                replica_id: wire.replica_id,
            },
            parent_id: Identifier {
                timestamp: wire.parent_timestamp,
                replica_id: wire.parent_replica_id,
            },
            value: wire.value,
            deleted: wire.deleted,
        }
    }
}

impl<T> From<NodeSnapshot<T>> for WireNode<T> {
    fn from(snapshot: NodeSnapshot<T>) -> Self {
        Self {
            timestamp: snapshot.id.timestamp,
            replica_id: snapshot.id.replica_id,
            parent_timestamp: snapshot.parent_id.timestamp,
            parent_replica_id: snapshot.parent_id.replica_id,
            value: snapshot.value,
            deleted: snapshot.deleted,
        }
    }
}
