use convergent_crdt::{GCounter, GCounterState, PNCounter, PNCounterState, ReplicaId};

// ── GCounter ─────────────────────────────────────────────────────

#[test]
fn gcounter_convergence() {
    let node_a = GCounter::new("node-a");
    let node_b = GCounter::new("node-b");

    node_a.increment();
    node_a.increment();
    node_b.increment();

    node_a.merge(&node_b);
    node_b.merge(&node_a);
    assert_eq!(node_a.value(), 3);
    assert_eq!(node_b.value(), 3);

    node_a.merge(&node_b);
    assert_eq!(node_a.value(), 3);
}

#[test]
fn gcounter_merge_order_does_not_matter() {
    let a = GCounter::new("a");
    let b = GCounter::new("b");
    let c = GCounter::new("c");
    a.increment_by(4);
    b.increment_by(2);
    c.increment_by(9);

    let left = GCounter::new("left");
    left.merge(&a);
    left.merge(&b);
    left.merge(&c);

    let right = GCounter::new("right");
    right.merge(&c);
    right.merge(&a);
    right.merge(&b);

    assert_eq!(left.snapshot(), right.snapshot());
    assert_eq!(left.value(), 15);
}

#[test]
fn gcounter_stale_state_does_not_regress() {
    let a = GCounter::new("a");
    a.increment();
    let stale = a.snapshot();
    a.increment();
    a.increment();

    a.merge_state(&stale);
    assert_eq!(a.value(), 3);
}

#[test]
fn gcounter_count_for_tracks_other_replicas() {
    let a = GCounter::new("a");
    let b = GCounter::new("b");
    b.increment_by(5);
    a.merge(&b);
    assert_eq!(a.count_for(&ReplicaId::new("b")), 5);
    assert_eq!(a.count_for(a.replica_id()), 0);
}

#[test]
fn gcounter_state_transport_roundtrip() {
    let a = GCounter::new("a");
    a.increment_by(3);
    let json = serde_json::to_string(&a.snapshot()).unwrap();
    let state: GCounterState = serde_json::from_str(&json).unwrap();

    let b = GCounter::new("b");
    b.merge_state(&state);
    assert_eq!(b.value(), 3);
}

// ── PNCounter ────────────────────────────────────────────────────

#[test]
fn pncounter_basic() {
    let counter = PNCounter::new("node-a");
    counter.increment();
    counter.increment();
    counter.decrement();
    assert_eq!(counter.value(), 1);
}

#[test]
fn pncounter_merge() {
    let node_a = PNCounter::new("node-a");
    let node_b = PNCounter::new("node-b");

    node_a.increment();
    node_b.decrement();

    node_a.merge(&node_b);
    node_b.merge(&node_a);
    assert_eq!(node_a.value(), 0);
    assert_eq!(node_b.value(), 0);
}

#[test]
fn pncounter_three_peer_convergence() {
    let a = PNCounter::new("a");
    let b = PNCounter::new("b");
    let c = PNCounter::new("c");

    a.increment_by(10);
    b.increment_by(20);
    b.decrement_by(5);
    c.decrement_by(3);

    for dst in [&a, &b, &c] {
        for src in [&a, &b, &c] {
            dst.merge(src);
        }
    }

    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(b.snapshot(), c.snapshot());
    assert_eq!(a.value(), 22);
}

#[test]
fn pncounter_halves_merge_independently() {
    let mut x = PNCounterState::new();
    x.increment(&ReplicaId::new("r"), 4);
    let mut y = PNCounterState::new();
    y.decrement(&ReplicaId::new("r"), 6);

    let merged = x.merged(&y);
    assert_eq!(merged.increments().get(&ReplicaId::new("r")), 4);
    assert_eq!(merged.decrements().get(&ReplicaId::new("r")), 6);
    assert_eq!(merged.value(), -2);
}

#[test]
fn pncounter_state_json_shape() {
    let c = PNCounter::new("a");
    c.increment_by(2);
    c.decrement();
    let json = serde_json::to_value(c.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "increments": { "a": 2 }, "decrements": { "a": 1 } })
    );
}
