//! Trie builder primitives (spec.md §4.2): pure node-walking helpers shared
//! by `AhoCorasick`'s `add`/`remove`/`pop`/`get`/`contains_*`/
//! `longest_prefix`. Kept free of phase/generation bookkeeping, which is
//! the mode controller's job (folded into `automaton.rs`).

use crate::node::Node;
use crate::state_id::StateID;
use crate::store::NodeStore;
use crate::symbol::Symbol;

/// Follows `symbols` from the root as far as the trie goes, recording every
/// node visited (including the root, at index 0). The returned path's
/// length is the longest matched prefix; it is the full key iff
/// `path.len() == symbols.len() + 1`.
pub(crate) fn walk<S: StateID>(store: &NodeStore<S>, symbols: &[Symbol]) -> Vec<S> {
    let mut path = Vec::with_capacity(symbols.len() + 1);
    let mut current = store.root();
    path.push(current);
    for &symbol in symbols {
        match store.get(current).child(symbol) {
            Some(next) => {
                current = next;
                path.push(current);
            }
            None => break,
        }
    }
    path
}

/// Returns the node reached by following `symbols` from the root exactly,
/// or `None` if `symbols` isn't a full trie path (spec.md
/// `contains_prefix`/`longest_prefix` support).
pub(crate) fn find<S: StateID>(store: &NodeStore<S>, symbols: &[Symbol]) -> Option<S> {
    let path = walk(store, symbols);
    if path.len() == symbols.len() + 1 {
        Some(*path.last().unwrap())
    } else {
        None
    }
}

/// Follows `symbols` from the root, creating nodes for any missing edges.
/// Returns the terminal node for the full key and whether any node was
/// freshly allocated along the way (used to decide if this is a structural
/// mutation for the generation counter).
///
/// Returns `None` if the node store ran out of representable ids.
pub(crate) fn insert_path<S: StateID>(
    store: &mut NodeStore<S>,
    symbols: &[Symbol],
) -> Option<(S, bool)> {
    let mut current = store.root();
    let mut created_any = false;
    for (depth, &symbol) in symbols.iter().enumerate() {
        match store.get(current).child(symbol) {
            Some(next) => current = next,
            None => {
                let next = store.alloc()?;
                store.get_mut(current).edges_mut().set(symbol, next);
                store.get_mut(next).set_depth(depth as u32 + 1);
                current = next;
                created_any = true;
            }
        }
    }
    Some((current, created_any))
}

/// After clearing a terminal flag at the end of `path` (the return value of
/// `walk`, root-inclusive), removes every trailing node that became both
/// non-terminal and childless, bottom-up, down to (but never including)
/// the root.
pub(crate) fn prune_dangling_path<S: StateID>(store: &mut NodeStore<S>, path: &[S]) {
    for window in path.windows(2).rev() {
        let (parent, child) = (window[0], window[1]);
        let removable = {
            let node: &Node<S> = store.get(child);
            !node.is_terminal() && node.is_leaf()
        };
        if !removable {
            break;
        }
        let symbol = {
            // Find which symbol on `parent` points at `child`.
            store
                .get(parent)
                .edges()
                .iter()
                .find(|&(_, target)| target == child)
                .map(|(s, _)| s)
                .expect("path nodes must be connected by an edge")
        };
        store.get_mut(parent).edges_mut().remove(symbol);
        store.free(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(s: &str) -> Vec<Symbol> {
        s.bytes().map(|b| b as Symbol).collect()
    }

    #[test]
    fn insert_then_walk_reaches_terminal() {
        let mut store: NodeStore<u32> = NodeStore::new();
        let (leaf, created) = insert_path(&mut store, &symbols("abc")).unwrap();
        assert!(created);
        store.get_mut(leaf).set_terminal(true);
        assert_eq!(find(&store, &symbols("abc")), Some(leaf));
        assert_eq!(find(&store, &symbols("ab")), None);
    }

    #[test]
    fn prune_removes_dangling_suffix_but_stops_at_shared_prefix() {
        let mut store: NodeStore<u32> = NodeStore::new();
        let (ab_node, _) = insert_path(&mut store, &symbols("ab")).unwrap();
        store.get_mut(ab_node).set_terminal(true);
        let (abc_node, _) = insert_path(&mut store, &symbols("abc")).unwrap();
        store.get_mut(abc_node).set_terminal(true);

        // remove "abc": its node becomes non-terminal and childless, so it
        // is pruned, but "ab" is still terminal and must survive.
        let path = walk(&store, &symbols("abc"));
        store.get_mut(abc_node).set_terminal(false);
        prune_dangling_path(&mut store, &path);

        assert_eq!(find(&store, &symbols("abc")), None);
        assert_eq!(find(&store, &symbols("ab")), Some(ab_node));
        assert!(store.get(ab_node).is_terminal());
    }
}
