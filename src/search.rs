//! Search iterator (spec.md §4.5): driven traversal over an input
//! sequence producing match events, plus the longest-match variant.
//!
//! Both iterators are plain structs implementing `Iterator`, following the
//! explicit-state-machine guidance in spec.md §9 ("model as explicit state
//! machines ... rather than co-routines") rather than anything suspendable.

use std::collections::VecDeque;

use crate::automaton::{AhoCorasick, Phase};
use crate::error::{Error, Result};
use crate::state_id::StateID;
use crate::symbol::{is_whitespace_symbol, Key, KeyType, Symbol};

fn require_finalized<V, S: StateID>(automaton: &AhoCorasick<V, S>) -> Result<()> {
    if automaton.phase() != Phase::AhoCorasick {
        return Err(Error::WrongPhase {
            expected: "AHOCORASICK",
            actual: automaton.phase().name(),
        });
    }
    Ok(())
}

fn resolve_window(symbols_len: usize, window: Option<(i64, i64)>) -> Result<(usize, usize)> {
    match window {
        None => Ok((0, symbols_len)),
        Some((start, end)) => {
            if start < 0 || end < 0 {
                return Err(Error::IndexError {
                    reason: "window bound must not be negative".into(),
                });
            }
            if end as usize > symbols_len {
                return Err(Error::IndexError {
                    reason: "window end exceeds input length".into(),
                });
            }
            if start > end {
                return Err(Error::IndexError {
                    reason: "window start exceeds window end".into(),
                });
            }
            Ok((start as usize, end as usize))
        }
    }
}

fn symbols_for<'k, V, S: StateID>(automaton: &AhoCorasick<V, S>, input: impl Into<Key<'k>>) -> Result<Vec<Symbol>> {
    let key = input.into();
    if key.key_type() != automaton.key_type() {
        return Err(Error::TypeMismatch {
            reason: format!(
                "automaton expects {:?} keys, got {:?}",
                automaton.key_type(),
                key.key_type()
            ),
        });
    }
    key.into_symbols(automaton.key_type())
}

/// Standard search iterator (spec.md §4.5): windowed, emits every
/// occurrence of every key, including overlapping ones.
pub struct Search<'a, V, S: StateID> {
    automaton: &'a AhoCorasick<V, S>,
    generation: u64,
    input: Vec<Symbol>,
    key_type: KeyType,
    start: usize,
    end: usize,
    pos: usize,
    state: S,
    ignore_white_space: bool,
    pending: VecDeque<(usize, S)>,
    dead: bool,
}

impl<'a, V, S: StateID> Search<'a, V, S> {
    pub(crate) fn new<'k>(
        automaton: &'a AhoCorasick<V, S>,
        input: impl Into<Key<'k>>,
        window: Option<(i64, i64)>,
        ignore_white_space: bool,
    ) -> Result<Self> {
        require_finalized(automaton)?;
        let symbols = symbols_for(automaton, input)?;
        let (start, end) = resolve_window(symbols.len(), window)?;
        Ok(Search {
            automaton,
            generation: automaton.generation(),
            input: symbols,
            key_type: automaton.key_type(),
            start,
            end,
            pos: start,
            state: automaton.root_id(),
            ignore_white_space,
            pending: VecDeque::new(),
            dead: false,
        })
    }

    /// Swaps in a new input (spec.md §4.5 "Reset and re-use"). With
    /// `hard`, the automaton state resets to root; otherwise it persists,
    /// supporting a logically continuous input streamed in chunks.
    pub fn reset<'k>(&mut self, input: impl Into<Key<'k>>, hard: bool) -> Result<()> {
        let symbols = symbols_for(self.automaton, input)?;
        self.start = 0;
        self.end = symbols.len();
        self.pos = 0;
        self.input = symbols;
        self.pending.clear();
        if hard {
            self.state = self.automaton.root_id();
        }
        Ok(())
    }
}

impl<'a, V, S: StateID> Iterator for Search<'a, V, S> {
    type Item = Result<(usize, &'a V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.generation != self.automaton.generation() {
            if self.dead {
                return None;
            }
            self.dead = true;
            return Some(Err(Error::Invalidated));
        }

        loop {
            if let Some((end_idx, node)) = self.pending.pop_front() {
                let value = self
                    .automaton
                    .payload(node)
                    .expect("terminal node must have a payload");
                return Some(Ok((end_idx, value)));
            }

            if self.pos >= self.end {
                return None;
            }

            let symbol = self.input[self.pos];
            self.pos += 1;

            if self.ignore_white_space && self.key_type == KeyType::String && is_whitespace_symbol(symbol) {
                continue;
            }

            self.state = self.automaton.step(self.state, symbol);

            let root = self.automaton.root_id();
            let mut cur = self.state;
            while cur != root {
                if self.automaton.is_terminal(cur) {
                    self.pending.push_back((self.pos - 1, cur));
                }
                cur = self.automaton.fail_of(cur);
            }
        }
    }
}

/// Longest-match search iterator (spec.md §4.5 "Longest-match variant"):
/// emits only the longest non-overlapping match starting at each scan
/// position. Worst-case quadratic time, as the spec notes.
pub struct LongestMatch<'a, V, S: StateID> {
    automaton: &'a AhoCorasick<V, S>,
    generation: u64,
    input: Vec<Symbol>,
    key_type: KeyType,
    end: usize,
    pos: usize,
    state: S,
    ignore_white_space: bool,
    last: Option<(usize, S)>,
    dead: bool,
}

impl<'a, V, S: StateID> LongestMatch<'a, V, S> {
    pub(crate) fn new<'k>(
        automaton: &'a AhoCorasick<V, S>,
        input: impl Into<Key<'k>>,
        window: Option<(i64, i64)>,
        ignore_white_space: bool,
    ) -> Result<Self> {
        require_finalized(automaton)?;
        let symbols = symbols_for(automaton, input)?;
        let (start, end) = resolve_window(symbols.len(), window)?;
        Ok(LongestMatch {
            automaton,
            generation: automaton.generation(),
            input: symbols,
            key_type: automaton.key_type(),
            end,
            pos: start,
            state: automaton.root_id(),
            ignore_white_space,
            last: None,
            dead: false,
        })
    }
}

impl<'a, V, S: StateID> Iterator for LongestMatch<'a, V, S> {
    type Item = Result<(usize, &'a V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.generation != self.automaton.generation() {
            if self.dead {
                return None;
            }
            self.dead = true;
            return Some(Err(Error::Invalidated));
        }

        let root = self.automaton.root_id();
        loop {
            if self.pos >= self.end {
                return self.last.take().map(|(end_idx, node)| {
                    let value = self
                        .automaton
                        .payload(node)
                        .expect("terminal node must have a payload");
                    Ok((end_idx, value))
                });
            }

            let symbol = self.input[self.pos];
            if self.ignore_white_space && self.key_type == KeyType::String && is_whitespace_symbol(symbol) {
                self.pos += 1;
                continue;
            }

            match self.automaton.child_of(self.state, symbol) {
                Some(child) => {
                    self.state = child;
                    if let Some(term) = self.automaton.deepest_output(child) {
                        self.last = Some((self.pos, term));
                    }
                    self.pos += 1;
                }
                None => {
                    if let Some((end_idx, node)) = self.last.take() {
                        self.pos = end_idx + 1;
                        self.state = root;
                        let value = self
                            .automaton
                            .payload(node)
                            .expect("terminal node must have a payload");
                        return Some(Ok((end_idx, value)));
                    }
                    self.state = self.automaton.step(self.state, symbol);
                    if let Some(term) = self.automaton.deepest_output(self.state) {
                        self.last = Some((self.pos, term));
                    }
                    self.pos += 1;
                }
            }
        }
    }
}
