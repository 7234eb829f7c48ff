//! The capability contract shared by every replicated type.
//!
//! Every variant can report its value and merge another replica of the same
//! variant. Merge must be:
//! - **Commutative**: merging A into B and B into A yields equal values
//! - **Associative**: grouping of merges does not matter
//! - **Idempotent**: merging the same state again changes nothing
//!
//! Merging a different variant fails with [`CrdtError::TypeMismatch`] and
//! leaves the receiver untouched.

use std::any::Any;
use std::fmt;

use crate::error::{CrdtError, Result};

/// Which variant a replicated value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrdtKind {
    /// Grow-only counter.
    GCounter,
    /// Positive/negative counter.
    PNCounter,
    /// Replicated growable array.
    Sequence,
}

impl fmt::Display for CrdtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GCounter => "g-counter",
            Self::PNCounter => "pn-counter",
            Self::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

/// The observable value of a replicated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrdtValue<T> {
    /// Value of either counter.
    Counter(i64),
    /// Visible elements of a sequence, in order.
    Sequence(Vec<T>),
}

impl<T> CrdtValue<T> {
    /// Returns the counter value, if this is a counter.
    #[must_use]
    pub fn as_counter(&self) -> Option<i64> {
        match self {
            Self::Counter(n) => Some(*n),
            Self::Sequence(_) => None,
        }
    }

    /// Returns the sequence elements, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[T]> {
        match self {
            Self::Sequence(items) => Some(items),
            Self::Counter(_) => None,
        }
    }

    /// Consumes the value, returning the sequence elements if any.
    #[must_use]
    pub fn into_sequence(self) -> Option<Vec<T>> {
        match self {
            Self::Sequence(items) => Some(items),
            Self::Counter(_) => None,
        }
    }
}

/// A state-based replicated data type.
///
/// `T` is the sequence payload type; counters implement the trait for every
/// `T` so that heterogeneous replicas can sit behind one `dyn Crdt<T>`.
pub trait Crdt<T> {
    /// Which variant this is.
    fn kind(&self) -> CrdtKind;

    /// The current value.
    fn value(&self) -> CrdtValue<T>;

    /// Merges another replica's state into this one.
    fn merge(&self, other: &dyn Crdt<T>) -> Result<()>;

    /// Upcast used to recover the concrete type of `other` in [`Crdt::merge`].
    fn as_any(&self) -> &dyn Any;
}

/// Downcasts `other` to the receiver's concrete type, or reports a mismatch.
pub(crate) fn downcast<'a, C: 'static, T>(
    expected: CrdtKind,
    other: &'a dyn Crdt<T>,
) -> Result<&'a C> {
    other.as_any().downcast_ref::<C>().ok_or_else(|| {
        let found = other.kind();
        tracing::debug!(%expected, %found, "rejecting merge across variants");
        CrdtError::TypeMismatch { expected, found }
    })
}
