//! Finalizer (spec.md §4.3): breadth-first construction of the failure
//! function, transitioning the automaton from TRIE to AHOCORASICK.
//!
//! Output propagation uses the fail-chain-walk-at-search-time strategy
//! (see `search.rs`) rather than precomputed output splicing, matching
//! `original_source/py/pyahocorasick.py`'s `Trie.iter`/`make_automaton`
//! split between "compute fail links here" and "walk them at match time".

use std::collections::VecDeque;

use crate::state_id::StateID;
use crate::store::NodeStore;
use crate::symbol::Symbol;

/// Computes `fail` for every node reachable from the root. A no-op if the
/// root has no children (spec.md step 1: "If the phase is EMPTY, do
/// nothing").
pub(crate) fn finalize<S: StateID>(store: &mut NodeStore<S>) {
    let root = store.root();

    let mut queue: VecDeque<S> = VecDeque::new();
    let root_edges: Vec<(Symbol, S)> = store.get(root).edges().iter().collect();
    for (_, child) in root_edges {
        store.get_mut(child).set_fail(root);
        queue.push_back(child);
    }

    while let Some(r) = queue.pop_front() {
        let edges: Vec<(Symbol, S)> = store.get(r).edges().iter().collect();
        for (symbol, n) in edges {
            queue.push_back(n);

            let mut state = store.get(r).fail();
            while state != root && store.get(state).child(symbol).is_none() {
                state = store.get(state).fail();
            }
            let fail = store.get(state).child(symbol).unwrap_or(root);
            store.get_mut(n).set_fail(fail);
        }
    }
}
