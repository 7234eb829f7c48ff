//! Core type definitions for the convergent CRDT library.
//!
//! This crate defines the small building blocks shared by every replicated
//! data type:
//! - Replica identifiers (opaque strings, optionally generated from UUID v7)
//! - Lamport logical clocks
//!
//! The data types themselves live in `convergent-crdt`.

mod clock;
mod ids;

pub use clock::LamportClock;
pub use ids::ReplicaId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid replica id: {0:?}")]
    InvalidReplicaId(String),
}
