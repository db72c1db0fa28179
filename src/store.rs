//! Node store: allocation and lookup of trie nodes (spec.md §4.1).
//!
//! Represented as a slab: a `Vec<Option<Node<S>>>` plus a free-list of
//! reclaimed slots, so that removing a key's dangling path actually frees
//! the slots (not just tombstones them) and a subsequent `add` can reuse
//! them. The root always lives at index `0` and is never freed.
//!
//! Because fail links and child edges are both plain `S` indices into this
//! arena rather than owning pointers, dropping the `Vec` is the entire
//! destructor: there is no cycle to walk around (spec.md §4.1, §9 "Cyclic
//! pointer graph").

use crate::node::Node;
use crate::state_id::{nil_id, usize_to_state_id, StateID};

pub(crate) struct NodeStore<S> {
    nodes: Vec<Option<Node<S>>>,
    free: Vec<S>,
    live: usize,
}

impl<S: StateID> NodeStore<S> {
    pub(crate) fn new() -> Self {
        let mut nodes = Vec::with_capacity(1);
        nodes.push(Some(Node::new()));
        NodeStore {
            nodes,
            free: Vec::new(),
            live: 1,
        }
    }

    pub(crate) fn root(&self) -> S {
        S::from_usize(0)
    }

    pub(crate) fn get(&self, id: S) -> &Node<S> {
        self.nodes[id.to_usize()]
            .as_ref()
            .expect("dangling node id")
    }

    pub(crate) fn get_mut(&mut self, id: S) -> &mut Node<S> {
        self.nodes[id.to_usize()]
            .as_mut()
            .expect("dangling node id")
    }

    /// Allocates a fresh node, reusing a freed slot if one is available.
    /// Returns `None` if the arena is full for `S`'s representation.
    pub(crate) fn alloc(&mut self) -> Option<S> {
        self.live += 1;
        if let Some(id) = self.free.pop() {
            self.nodes[id.to_usize()] = Some(Node::new());
            return Some(id);
        }
        let id = usize_to_state_id::<S>(self.nodes.len())?;
        self.nodes.push(Some(Node::new()));
        Some(id)
    }

    /// Releases a node's slot for reuse. Must not be called on the root.
    pub(crate) fn free(&mut self, id: S) {
        debug_assert!(id != self.root(), "root node must never be freed");
        self.nodes[id.to_usize()] = None;
        self.free.push(id);
        self.live -= 1;
    }

    /// Releases every node except the root, resetting the arena to its
    /// just-constructed state (spec.md: `clear()` "releases all nodes
    /// except the root").
    pub(crate) fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Some(Node::new());
        self.free.clear();
        self.live = 1;
    }

    /// Number of live (non-freed) nodes, including the root.
    pub(crate) fn node_count(&self) -> usize {
        self.live
    }

    /// Total outgoing edges across every live node.
    pub(crate) fn link_count(&self) -> usize {
        self.nodes
            .iter()
            .flatten()
            .map(|n| n.edges().len())
            .sum()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Option<Node<S>>>()
            + self.nodes.iter().flatten().map(Node::heap_bytes).sum::<usize>()
    }

    /// Capacity of the underlying slab, i.e. one past the highest id ever
    /// allocated (freed slots included). Used by the finalizer/persistence
    /// layer to size dense scratch arrays indexed by node id.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_live(&self, id: S) -> bool {
        id.to_usize() < self.nodes.len() && self.nodes[id.to_usize()].is_some()
    }

    pub(crate) fn nil(&self) -> S {
        nil_id()
    }
}
