//! Key-enumeration iterator (spec.md §4.4): a lazy, finite,
//! non-restartable depth-first walk over the terminal nodes reachable
//! from a given starting node, with an optional prefix constraint and an
//! optional wildcard template.
//!
//! Plain enumeration (no wildcard) is driven by an explicit stack of
//! `(node, remaining children)` frames — spec.md §9's "model as explicit
//! state machines with a stack of (node, child-iterator) frames rather
//! than co-routines". Wildcard enumeration instead collects matches
//! eagerly via recursion at construction time: a template wildcard can
//! branch into every outgoing edge at once, which doesn't reduce to a
//! single linear stack the way plain prefix descent does.

use crate::automaton::AhoCorasick;
use crate::error::{Error, Result};
use crate::state_id::StateID;
use crate::store::NodeStore;
use crate::symbol::{KeyBuf, Symbol};

/// Which terminals a wildcard template selects, relative to the
/// template's length (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardMode {
    /// Only terminals at depth exactly equal to the template length.
    ExactLength,
    /// Terminals at depth less than or equal to the template length,
    /// encountered anywhere along the (possibly branching) template walk.
    AtMostPrefix,
    /// Terminals reached by following the template, then descending
    /// freely below it.
    AtLeastPrefix,
}

struct Frame<S> {
    children: Vec<(Symbol, S)>,
    idx: usize,
}

enum Source<S> {
    /// Plain DFS over the trie below `pending_root`, constrained only by
    /// the (already-resolved) starting prefix node.
    Tree {
        stack: Vec<Frame<S>>,
        pending_root: Option<S>,
    },
    /// Wildcard matches, collected eagerly at construction.
    Flat {
        items: Vec<(Vec<Symbol>, S)>,
        idx: usize,
    },
}

/// The iterator behind `keys()`/`values()`/`items()` and their
/// prefix/wildcard variants. Captures the automaton's generation counter
/// at creation and fails with `Error::Invalidated` on the first `next()`
/// after a structural mutation (spec.md §4.4's invalidation rule; a pure
/// payload overwrite on an already-terminal node does not count, since it
/// never bumps the generation counter in the first place).
pub struct Entries<'a, V, S: StateID> {
    automaton: &'a AhoCorasick<V, S>,
    generation: u64,
    prefix: Vec<Symbol>,
    path: Vec<Symbol>,
    source: Source<S>,
    dead: bool,
}

impl<'a, V, S: StateID> Entries<'a, V, S> {
    pub(crate) fn new_tree(automaton: &'a AhoCorasick<V, S>, start: Option<S>, prefix: Vec<Symbol>) -> Self {
        let (stack, pending_root) = match start {
            Some(node) => {
                let children = automaton.edges_of(node);
                (vec![Frame { children, idx: 0 }], Some(node))
            }
            None => (Vec::new(), None),
        };
        Entries {
            automaton,
            generation: automaton.generation(),
            prefix,
            path: Vec::new(),
            source: Source::Tree { stack, pending_root },
            dead: false,
        }
    }

    pub(crate) fn new_flat(automaton: &'a AhoCorasick<V, S>, items: Vec<(Vec<Symbol>, S)>) -> Self {
        Entries {
            automaton,
            generation: automaton.generation(),
            prefix: Vec::new(),
            path: Vec::new(),
            source: Source::Flat { items, idx: 0 },
            dead: false,
        }
    }
}

impl<'a, V, S: StateID> Iterator for Entries<'a, V, S> {
    type Item = Result<(KeyBuf, &'a V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.generation != self.automaton.generation() {
            if self.dead {
                return None;
            }
            self.dead = true;
            return Some(Err(Error::Invalidated));
        }

        match &mut self.source {
            Source::Flat { items, idx } => {
                if *idx >= items.len() {
                    return None;
                }
                let (path, node) = &items[*idx];
                *idx += 1;
                let key = KeyBuf::from_symbols(self.automaton.key_type(), path);
                let value = self
                    .automaton
                    .payload(*node)
                    .expect("terminal node must have a payload");
                Some(Ok((key, value)))
            }
            Source::Tree { stack, pending_root } => {
                if let Some(node) = pending_root.take() {
                    if self.automaton.is_terminal(node) {
                        let key = KeyBuf::from_symbols(self.automaton.key_type(), &self.prefix);
                        let value = self
                            .automaton
                            .payload(node)
                            .expect("terminal node must have a payload");
                        return Some(Ok((key, value)));
                    }
                }
                loop {
                    let frame = stack.last_mut()?;
                    match frame.children.get(frame.idx).copied() {
                        Some((symbol, child)) => {
                            frame.idx += 1;
                            self.path.push(symbol);
                            let children = self.automaton.edges_of(child);
                            stack.push(Frame { children, idx: 0 });
                            if self.automaton.is_terminal(child) {
                                let mut full = self.prefix.clone();
                                full.extend_from_slice(&self.path);
                                let key = KeyBuf::from_symbols(self.automaton.key_type(), &full);
                                let value = self
                                    .automaton
                                    .payload(child)
                                    .expect("terminal node must have a payload");
                                return Some(Ok((key, value)));
                            }
                        }
                        None => {
                            stack.pop();
                            self.path.pop();
                        }
                    }
                }
            }
        }
    }
}

/// Eagerly collects every `(path, node)` pair a wildcard template selects
/// (spec.md §4.4 "Wildcard match"). `template[i] == wildcard` matches any
/// single outgoing edge at that position; any other symbol must match
/// exactly, or the branch dies without a match.
pub(crate) fn collect_wildcard<S: StateID>(
    store: &NodeStore<S>,
    template: &[Symbol],
    wildcard: Symbol,
    mode: WildcardMode,
) -> Vec<(Vec<Symbol>, S)> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk_template(store, store.root(), 0, template, wildcard, mode, &mut path, &mut out);
    out
}

#[allow(clippy::too_many_arguments)]
fn walk_template<S: StateID>(
    store: &NodeStore<S>,
    node: S,
    depth: usize,
    template: &[Symbol],
    wildcard: Symbol,
    mode: WildcardMode,
    path: &mut Vec<Symbol>,
    out: &mut Vec<(Vec<Symbol>, S)>,
) {
    if depth == template.len() {
        match mode {
            WildcardMode::AtLeastPrefix => free_descend(store, node, path, out),
            WildcardMode::ExactLength | WildcardMode::AtMostPrefix => {
                if store.get(node).is_terminal() {
                    out.push((path.clone(), node));
                }
            }
        }
        return;
    }

    if mode == WildcardMode::AtMostPrefix && store.get(node).is_terminal() {
        out.push((path.clone(), node));
    }

    let symbol = template[depth];
    if symbol == wildcard {
        for (edge_symbol, child) in store.get(node).edges().iter() {
            path.push(edge_symbol);
            walk_template(store, child, depth + 1, template, wildcard, mode, path, out);
            path.pop();
        }
    } else if let Some(child) = store.get(node).child(symbol) {
        path.push(symbol);
        walk_template(store, child, depth + 1, template, wildcard, mode, path, out);
        path.pop();
    }
}

fn free_descend<S: StateID>(
    store: &NodeStore<S>,
    node: S,
    path: &mut Vec<Symbol>,
    out: &mut Vec<(Vec<Symbol>, S)>,
) {
    if store.get(node).is_terminal() {
        out.push((path.clone(), node));
    }
    for (symbol, child) in store.get(node).edges().iter() {
        path.push(symbol);
        free_descend(store, child, path, out);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AhoCorasick;

    fn dict() -> AhoCorasick<i32> {
        let mut ac: AhoCorasick<i32> = AhoCorasick::new();
        for (i, w) in ["he", "hers", "his", "she"].iter().enumerate() {
            ac.add(*w, i as i32).unwrap();
        }
        ac
    }

    #[test]
    fn plain_enumeration_yields_every_key() {
        let ac = dict();
        let mut keys: Vec<String> = ac
            .keys()
            .map(|r| r.unwrap().to_string_lossy().into_owned())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["he", "hers", "his", "she"]);
    }

    #[test]
    fn prefix_enumeration_restricts_to_subtree() {
        let ac = dict();
        let mut keys: Vec<String> = ac
            .iter_with_prefix("he")
            .unwrap()
            .map(|r| r.unwrap().0.to_string_lossy().into_owned())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["he", "hers"]);
    }

    #[test]
    fn prefix_not_in_trie_yields_nothing() {
        let ac = dict();
        let keys: Vec<_> = ac.iter_with_prefix("xyz").unwrap().collect();
        assert!(keys.is_empty());
    }

    #[test]
    fn wildcard_exact_length() {
        let ac = dict();
        // "h?" with '?' wildcard, exact length 2: matches "he" only.
        let got: Vec<String> = ac
            .keys_matching("h?", "?", WildcardMode::ExactLength)
            .unwrap()
            .map(|r| r.unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(got, vec!["he"]);
    }

    #[test]
    fn wildcard_at_least_prefix_descends_freely() {
        let ac = dict();
        let mut got: Vec<String> = ac
            .keys_matching("h?", "?", WildcardMode::AtLeastPrefix)
            .unwrap()
            .map(|r| r.unwrap().to_string_lossy().into_owned())
            .collect();
        got.sort();
        assert_eq!(got, vec!["he", "hers", "his"]);
    }

    #[test]
    fn wildcard_at_most_prefix_includes_shorter_terminals() {
        let ac = dict();
        let mut got: Vec<String> = ac
            .keys_matching("he?", "?", WildcardMode::AtMostPrefix)
            .unwrap()
            .map(|r| r.unwrap().to_string_lossy().into_owned())
            .collect();
        got.sort();
        // "he" (depth 2, <= 3) qualifies; "hers" (depth 4) does not.
        assert_eq!(got, vec!["he"]);
    }

    #[test]
    fn multi_symbol_wildcard_is_rejected() {
        let ac = dict();
        let err = ac
            .keys_matching("he", "??", WildcardMode::ExactLength)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn invalidated_after_structural_mutation() {
        let mut ac = dict();
        let mut it = ac.iter();
        assert!(it.next().is_some());
        ac.add("xx", 99).unwrap();
        let mut saw_invalidated = false;
        for r in it {
            if matches!(r, Err(Error::Invalidated)) {
                saw_invalidated = true;
            }
        }
        assert!(saw_invalidated);
    }

    #[test]
    fn payload_overwrite_does_not_invalidate() {
        let mut ac = dict();
        let mut it = ac.iter();
        assert!(it.next().is_some());
        // can't call ac.add while `it` borrows ac immutably and lives on;
        // drop it first, reborrow to prove the generation is unaffected
        // by a payload-only overwrite instead.
        drop(it);
        let before = ac.generation();
        ac.add("he", 123).unwrap();
        assert_eq!(ac.generation(), before);
    }
}
