//! Append-only node arena.
//!
//! The registry is the single owner of every node a sequence has ever seen.
//! Nodes refer to each other by [`NodeIndex`] into the arena, so the linked
//! traversal order carries no owning or aliased pointers. Entries are never
//! removed; deletion only flips a node's tombstone flag.

use std::collections::HashMap;

use crate::identifier::Identifier;
use crate::node::Node;

/// Position of a node in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIndex(usize);

impl NodeIndex {
    /// The root sentinel always occupies the first slot.
    pub(crate) const ROOT: Self = Self(0);
}

#[derive(Debug, Clone)]
pub(crate) struct Registry<T> {
    nodes: Vec<Node<T>>,
    index: HashMap<Identifier, NodeIndex>,
}

impl<T> Registry<T> {
    /// Creates a registry holding only the root sentinel.
    pub(crate) fn new() -> Self {
        let root = Node::root();
        let mut index = HashMap::new();
        index.insert(root.id.clone(), NodeIndex::ROOT);
        Self {
            nodes: vec![root],
            index,
        }
    }

    /// Number of nodes, including the root and tombstones.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn lookup(&self, id: &Identifier) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn get(&self, id: &Identifier) -> Option<&Node<T>> {
        self.lookup(id).map(|idx| self.node(idx))
    }

    pub(crate) fn get_mut(&mut self, id: &Identifier) -> Option<&mut Node<T>> {
        let idx = self.lookup(id)?;
        Some(self.node_mut(idx))
    }

    /// Indices are only minted by [`Registry::push`], so they are always in
    /// bounds.
    pub(crate) fn node(&self, idx: NodeIndex) -> &Node<T> {
        &self.nodes[idx.0]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut Node<T> {
        &mut self.nodes[idx.0]
    }

    /// Appends a node to the arena. The caller links it into traversal order.
    pub(crate) fn push(&mut self, node: Node<T>) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    /// Walks the traversal order starting after the root.
    pub(crate) fn linked(&self) -> Linked<'_, T> {
        Linked {
            registry: self,
            cursor: self.node(NodeIndex::ROOT).next,
        }
    }
}

/// Iterator over nodes in traversal order (tombstones included).
pub(crate) struct Linked<'a, T> {
    registry: &'a Registry<T>,
    cursor: Option<NodeIndex>,
}

impl<'a, T> Iterator for Linked<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.registry.node(self.cursor?);
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSnapshot;

    fn snapshot(ts: u64, parent: Identifier, value: char) -> NodeSnapshot<char> {
        NodeSnapshot::new(Identifier::new(ts, "r"), parent, value)
    }

    #[test]
    fn new_registry_holds_root() {
        let registry: Registry<char> = Registry::new();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&Identifier::root()));
        assert_eq!(registry.lookup(&Identifier::root()), Some(NodeIndex::ROOT));
        assert_eq!(registry.linked().count(), 0);
    }

    #[test]
    fn push_and_link() {
        let mut registry = Registry::new();
        let a = registry.push(Node::from_snapshot(snapshot(1, Identifier::root(), 'a'), None));
        registry.node_mut(NodeIndex::ROOT).next = Some(a);
        let b = registry.push(Node::from_snapshot(
            snapshot(2, Identifier::new(1, "r"), 'b'),
            None,
        ));
        registry.node_mut(a).next = Some(b);

        let values: Vec<char> = registry.linked().filter_map(|n| n.value).collect();
        assert_eq!(values, vec!['a', 'b']);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(&Identifier::new(2, "r")).map(|n| n.value), Some(Some('b')));
    }

    #[test]
    fn get_mut_flags_in_place() {
        let mut registry = Registry::new();
        registry.push(Node::from_snapshot(snapshot(1, Identifier::root(), 'a'), None));
        registry.get_mut(&Identifier::new(1, "r")).unwrap().deleted = true;
        assert!(registry.get(&Identifier::new(1, "r")).unwrap().deleted);
        assert!(registry.get_mut(&Identifier::new(9, "r")).is_none());
    }
}
