//! Shared helpers for integration tests.

#![allow(dead_code)]

use convergent_crdt::{Identifier, NodeSnapshot, Rga};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; honours `RUST_LOG`, defaults to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn root() -> Identifier {
    Identifier::root()
}

/// Every non-root node a replica holds, as a transport would ship it.
pub fn nodes_of<T: Clone>(rga: &Rga<T>) -> Vec<NodeSnapshot<T>> {
    rga.snapshot()
}

/// Merges every replica into every other, twice.
pub fn sync_all<T: Clone>(replicas: &[Rga<T>]) {
    for _ in 0..2 {
        for dst in replicas {
            for src in replicas {
                dst.merge(src);
            }
        }
    }
}

/// Asserts that all replicas show the same value.
pub fn assert_converged<T: Clone + PartialEq + std::fmt::Debug>(replicas: &[Rga<T>]) {
    let reference = replicas[0].value();
    for (i, replica) in replicas.iter().enumerate().skip(1) {
        assert_eq!(replica.value(), reference, "replica {i} diverged");
    }
}
