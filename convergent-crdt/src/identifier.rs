//! Sequence element identifiers and their total order.

use convergent_types::ReplicaId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CrdtError;

/// Unique identifier for an element in the sequence.
///
/// Combines a Lamport timestamp with the id of the replica that minted it.
/// The ordering ranks concurrent siblings; it is not a causal order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Lamport time at which the element was created.
    pub timestamp: u64,
    /// Which replica created the element.
    pub replica_id: ReplicaId,
}

impl Identifier {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(timestamp: u64, replica_id: impl Into<ReplicaId>) -> Self {
        Self {
            timestamp,
            replica_id: replica_id.into(),
        }
    }

    /// The identifier of the root sentinel: `(0, "root")`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            timestamp: 0,
            replica_id: ReplicaId::root(),
        }
    }

    /// Returns true if this is the root sentinel.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.timestamp == 0 && self.replica_id.as_str() == ReplicaId::ROOT
    }

    /// Returns true if `self` outranks `other`.
    ///
    /// Higher timestamp wins; equal timestamps fall back to the
    /// lexicographically greater replica id.
    #[must_use]
    pub fn greater(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.replica_id.cmp(&other.replica_id))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.timestamp, self.replica_id)
    }
}

impl FromStr for Identifier {
    type Err = CrdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CrdtError::InvalidIdentifier(s.to_string());

        // Replica ids may themselves contain ':'.
        let (timestamp, replica) = s.split_once(':').ok_or_else(invalid)?;
        let timestamp: u64 = timestamp.parse().map_err(|_| invalid())?;
        let replica_id: ReplicaId = replica.parse().map_err(|_| invalid())?;

        Ok(Self {
            timestamp,
            replica_id,
        })
    }
}
