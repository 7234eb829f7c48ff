//! Error types for the CRDT crate.

use crate::crdt::CrdtKind;
use crate::identifier::Identifier;
use thiserror::Error;

/// Errors returned by CRDT operations.
///
/// Every failing operation leaves the instance untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrdtError {
    /// An insert referenced a parent that is not in the local registry.
    #[error("unknown parent: {0}")]
    UnknownParent(Identifier),

    /// The local clock reached `u64::MAX`; no fresh identifier can be minted.
    #[error("clock exhausted: no timestamp left to mint")]
    ClockExhausted,

    /// A merge was attempted between two different CRDT variants.
    #[error("type mismatch: cannot merge {found} into {expected}")]
    TypeMismatch { expected: CrdtKind, found: CrdtKind },

    /// Text could not be parsed as an identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias using [`CrdtError`].
pub type Result<T> = std::result::Result<T, CrdtError>;
