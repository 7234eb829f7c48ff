//! State-based CRDT implementations.
//!
//! This crate provides Convergent Replicated Data Types:
//!
//! - [`GCounter`]: grow-only counter with one slot per replica
//! - [`PNCounter`]: positive/negative counter built from two grow-only halves
//! - [`Rga<T>`]: replicated Growable Array for sequences/text
//!
//! All of them implement the [`Crdt`] capability contract, and all of them
//! satisfy the following properties:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! These properties ensure that replicas will converge to the same state
//! regardless of the order in which updates are received.
//!
//! Every replica guards its state with its own reader/writer lock, so
//! instances can be shared across threads. Merges never hold two replicas'
//! locks at once.
//!
//! ```
//! use convergent_crdt::{Identifier, Rga};
//!
//! let alice = Rga::new("alice");
//! let bob = Rga::new("bob");
//!
//! let h = alice.insert('H', &Identifier::root()).unwrap();
//! alice.insert('E', &h).unwrap();
//!
//! bob.merge_nodes(alice.snapshot());
//! assert_eq!(bob.text(), "HE");
//! ```

mod crdt;
mod error;
mod g_counter;
mod identifier;
mod node;
mod orphans;
mod pn_counter;
mod registry;
mod rga;

pub use convergent_types::{LamportClock, ReplicaId};
pub use crdt::{Crdt, CrdtKind, CrdtValue};
pub use error::{CrdtError, Result};
pub use g_counter::{GCounter, GCounterState};
pub use identifier::Identifier;
pub use node::NodeSnapshot;
pub use pn_counter::{PNCounter, PNCounterState};
pub use rga::{Rga, RgaConfig};
