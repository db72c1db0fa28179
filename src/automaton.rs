//! The top-level automaton: owns the node store, the value layer, and the
//! mode & invalidation controller (spec.md §3 "Automaton", §4.7).
//!
//! Phase transitions and the generation counter live here rather than in a
//! separate module because every other component's legality depends on
//! them (§4.7's transition table references add/remove/clear/finalize/
//! search/enumerate, which are method calls on this type).

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::finalize;
use crate::iter_keys::{self, Entries, WildcardMode};
use crate::search::{LongestMatch, Search};
use crate::state_id::StateID;
use crate::store::NodeStore;
use crate::symbol::{Key, KeyType, Symbol};
use crate::trie;
use crate::value::{StoreMode, ValueStore};

/// Lifecycle stage of the automaton (spec.md §6: EMPTY = 0, TRIE = 1,
/// AHOCORASICK = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Empty = 0,
    Trie = 1,
    AhoCorasick = 2,
}

impl Phase {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Phase::Empty => "EMPTY",
            Phase::Trie => "TRIE",
            Phase::AhoCorasick => "AHOCORASICK",
        }
    }
}

/// Read-only snapshot of the automaton's size (spec.md §6 "Statistics
/// record").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    pub nodes_count: usize,
    pub words_count: usize,
    pub links_count: usize,
    pub longest_word: usize,
    pub sizeof_node: usize,
    pub total_size: usize,
}

/// A multi-pattern exact-match automaton: trie, Aho-Corasick matcher, and
/// persistent dictionary rolled into one (spec.md §1).
///
/// Generic over the payload type `V` and the node-id representation `S`
/// (defaulting to `u32`; see `state_id.rs`).
pub struct AhoCorasick<V, S: StateID = u32> {
    pub(crate) store: NodeStore<S>,
    pub(crate) values: ValueStore<V>,
    pub(crate) key_type: KeyType,
    pub(crate) phase: Phase,
    pub(crate) generation: u64,
    pub(crate) key_count: usize,
    pub(crate) longest_key: usize,
    _marker: PhantomData<V>,
}

impl<V, S: StateID> AhoCorasick<V, S> {
    /// Builds an automaton with `StoreMode::Opaque` and `KeyType::String`.
    /// Use [`crate::builder::AhoCorasickBuilder`] for other configurations.
    pub fn new() -> Self {
        Self::with_options(StoreMode::Opaque, KeyType::String)
    }

    /// Builds a `StoreMode::Opaque`, `KeyType::Sequence` automaton, for
    /// keys that are integer sequences rather than byte strings.
    pub fn new_sequence() -> Self {
        Self::with_options(StoreMode::Opaque, KeyType::Sequence)
    }

    pub(crate) fn with_options(store_mode: StoreMode, key_type: KeyType) -> Self {
        AhoCorasick {
            store: NodeStore::new(),
            values: ValueStore::new(store_mode),
            key_type,
            phase: Phase::Empty,
            generation: 0,
            key_count: 0,
            longest_key: 0,
            _marker: PhantomData,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn store_mode(&self) -> StoreMode {
        self.values.mode()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    pub fn stats(&self) -> Statistics {
        let sizeof_node = std::mem::size_of::<crate::node::Node<S>>();
        let nodes_count = self.store.node_count();
        let total_size = nodes_count * sizeof_node + self.store.heap_bytes();
        Statistics {
            nodes_count,
            words_count: self.key_count,
            links_count: self.store.link_count(),
            longest_word: self.longest_key,
            sizeof_node,
            total_size,
        }
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
    }

    fn to_symbols<'a>(&self, key: impl Into<Key<'a>>) -> Result<Vec<Symbol>> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidKey {
                reason: "key must not be empty".into(),
            });
        }
        key.into_symbols(self.key_type)
    }

    /// Like `to_symbols`, but allows an empty key: prefix/contains queries
    /// on `""` are legal, they just answer questions about the root.
    fn to_symbols_probe<'a>(&self, key: impl Into<Key<'a>>) -> Result<Vec<Symbol>> {
        key.into().into_symbols(self.key_type)
    }

    /// Inserts `key` with `value`. Returns `true` if this created a new
    /// entry, `false` if it replaced an existing one's payload (spec.md
    /// §4.2 `add`).
    #[tracing::instrument(level = "debug", skip(self, value))]
    pub fn add<'a>(&mut self, key: impl Into<Key<'a>>, value: V) -> Result<bool> {
        let symbols = self.to_symbols(key)?;
        let (node, created_nodes) =
            trie::insert_path(&mut self.store, &symbols).ok_or(Error::ArenaExhausted)?;

        let was_terminal = self.store.get(node).is_terminal();
        self.store.get_mut(node).set_terminal(true);
        self.values.set(node, value);

        let became_terminal = !was_terminal;
        if created_nodes || became_terminal {
            if became_terminal {
                self.key_count += 1;
            }
            self.longest_key = self.longest_key.max(symbols.len());
            self.bump_generation();
            self.phase = Phase::Trie;
            tracing::debug!(
                nodes = self.store.node_count(),
                keys = self.key_count,
                generation = self.generation,
                "inserted key"
            );
        }

        Ok(became_terminal)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove<'a>(&mut self, key: impl Into<Key<'a>>) -> Result<bool> {
        match self.pop(key) {
            Ok(_) => Ok(true),
            Err(Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes `key`, returning its previous payload, or `NotFound` if it
    /// wasn't present.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn pop<'a>(&mut self, key: impl Into<Key<'a>>) -> Result<V> {
        let symbols = self.to_symbols(key)?;
        let path = trie::walk(&self.store, &symbols);
        if path.len() != symbols.len() + 1 || !self.store.get(*path.last().unwrap()).is_terminal()
        {
            return Err(Error::NotFound);
        }
        let terminal = *path.last().unwrap();
        self.store.get_mut(terminal).set_terminal(false);
        let value = self
            .values
            .take(terminal)
            .expect("terminal always has a payload");
        trie::prune_dangling_path(&mut self.store, &path);

        self.key_count -= 1;
        self.bump_generation();
        self.phase = if self.key_count == 0 {
            Phase::Empty
        } else {
            Phase::Trie
        };
        tracing::debug!(
            nodes = self.store.node_count(),
            keys = self.key_count,
            generation = self.generation,
            "removed key"
        );
        Ok(value)
    }

    /// Returns the payload for `key`, or `NotFound` if absent.
    pub fn get<'a>(&self, key: impl Into<Key<'a>>) -> Result<&V> {
        self.get_opt(key)?.ok_or(Error::NotFound)
    }

    /// Returns the payload for `key`, or `None` if absent, without erroring
    /// on a miss (spec.md: "probing operations ... return a sentinel").
    pub fn get_opt<'a>(&self, key: impl Into<Key<'a>>) -> Result<Option<&V>> {
        let symbols = self.to_symbols_probe(key)?;
        Ok(trie::find(&self.store, &symbols)
            .filter(|&n| self.store.get(n).is_terminal())
            .and_then(|n| self.values.get(n)))
    }

    /// True iff the trie has a node reached by `key` (spec.md
    /// `contains_prefix`).
    pub fn contains_prefix<'a>(&self, key: impl Into<Key<'a>>) -> Result<bool> {
        let symbols = self.to_symbols_probe(key)?;
        Ok(trie::find(&self.store, &symbols).is_some())
    }

    /// True iff `key` names a terminal node (spec.md `contains_exact`).
    pub fn contains_exact<'a>(&self, key: impl Into<Key<'a>>) -> Result<bool> {
        let symbols = self.to_symbols_probe(key)?;
        Ok(trie::find(&self.store, &symbols)
            .map(|n| self.store.get(n).is_terminal())
            .unwrap_or(false))
    }

    /// Length of the longest prefix of `key` that is a trie path (spec.md
    /// `longest_prefix`).
    pub fn longest_prefix<'a>(&self, key: impl Into<Key<'a>>) -> Result<usize> {
        let symbols = self.to_symbols_probe(key)?;
        Ok(trie::walk(&self.store, &symbols).len() - 1)
    }

    /// Releases all nodes except the root and resets to `Phase::Empty`
    /// (spec.md `clear()`).
    pub fn clear(&mut self) {
        self.store.clear();
        self.values.clear();
        self.key_count = 0;
        self.longest_key = 0;
        self.phase = Phase::Empty;
        self.bump_generation();
        tracing::debug!(generation = self.generation, "cleared automaton");
    }

    /// Computes failure links, transitioning TRIE -> AHOCORASICK. A no-op
    /// while EMPTY (spec.md §4.3 step 1).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn finalize(&mut self) {
        if self.phase == Phase::Empty {
            return;
        }
        finalize::finalize(&mut self.store);
        self.phase = Phase::AhoCorasick;
        self.bump_generation();
        tracing::debug!(
            generation = self.generation,
            nodes = self.store.node_count(),
            "finalized automaton"
        );
    }

    // --- low-level accessors shared by the search and enumeration
    // iterators (spec.md §4.4, §4.5). Kept private to the crate so those
    // modules never reach into `store`/`values` directly.

    pub(crate) fn root_id(&self) -> S {
        self.store.root()
    }

    pub(crate) fn is_terminal(&self, id: S) -> bool {
        self.store.get(id).is_terminal()
    }

    pub(crate) fn fail_of(&self, id: S) -> S {
        self.store.get(id).fail()
    }

    pub(crate) fn child_of(&self, id: S, symbol: Symbol) -> Option<S> {
        self.store.get(id).child(symbol)
    }

    pub(crate) fn payload(&self, id: S) -> Option<&V> {
        self.values.get(id)
    }

    pub(crate) fn edges_of(&self, id: S) -> Vec<(Symbol, S)> {
        self.store.get(id).edges().iter().collect()
    }

    /// One step of goto+fail from `state` consuming `symbol` (spec.md
    /// §4.5: "while S has no edge labeled c and S is not root, S <-
    /// fail(S); then S <- edge(S, c) if present, else root").
    pub(crate) fn step(&self, state: S, symbol: Symbol) -> S {
        let s = self.fail_walk_to_edge(state, symbol);
        self.child_of(s, symbol).unwrap_or(self.root_id())
    }

    /// Just the fail-chain-walk half of [`Self::step`]: advances `state`
    /// via fail links until it has an edge labeled `symbol`, or it is the
    /// root. Used by the longest-match variant's fallback path, which
    /// (per spec.md §4.5) walks fail links without yet consuming the
    /// edge.
    pub(crate) fn fail_walk_to_edge(&self, mut state: S, symbol: Symbol) -> S {
        let root = self.root_id();
        while state != root && self.child_of(state, symbol).is_none() {
            state = self.fail_of(state);
        }
        state
    }

    /// The deepest node along `state`'s fail chain (inclusive of `state`
    /// itself) that is terminal, i.e. the output function at `state`
    /// restricted to its single longest member (spec.md GLOSSARY "Output
    /// function"; used by the longest-match variant to pick its
    /// candidate).
    pub(crate) fn deepest_output(&self, mut state: S) -> Option<S> {
        let root = self.root_id();
        loop {
            if self.is_terminal(state) {
                return Some(state);
            }
            if state == root {
                return None;
            }
            state = self.fail_of(state);
        }
    }

    /// Enumerates every stored key and its payload (spec.md §4.4
    /// `items()`), depth-first from the root.
    pub fn iter(&self) -> Entries<'_, V, S> {
        Entries::new_tree(self, Some(self.root_id()), Vec::new())
    }

    /// Like [`Self::iter`], but only descends from the node reached by
    /// `prefix`; yields nothing if `prefix` isn't a trie path (spec.md
    /// §4.4 "Prefix filter").
    pub fn iter_with_prefix<'k>(&self, prefix: impl Into<Key<'k>>) -> Result<Entries<'_, V, S>> {
        let symbols = self.to_symbols_probe(prefix)?;
        let start = trie::find(&self.store, &symbols);
        Ok(Entries::new_tree(self, start, symbols))
    }

    /// The keys stored in this automaton (spec.md §4.4 `keys()`).
    pub fn keys(&self) -> impl Iterator<Item = Result<crate::symbol::KeyBuf>> + '_ {
        self.iter().map(|r| r.map(|(k, _)| k))
    }

    /// The payloads stored in this automaton (spec.md §4.4 `values()`).
    pub fn values(&self) -> impl Iterator<Item = Result<&V>> + '_ {
        self.iter().map(|r| r.map(|(_, v)| v))
    }

    /// Every stored `(key, value)` pair (spec.md §4.4 `items()`); an alias
    /// for [`Self::iter`] under the name the spec gives it.
    pub fn items(&self) -> Entries<'_, V, S> {
        self.iter()
    }

    /// Keys matching a wildcard template (spec.md §4.4 "Wildcard match").
    /// `wildcard` must resolve to exactly one symbol, or this fails with
    /// `InvalidArgument`.
    pub fn keys_matching<'k>(
        &self,
        template: impl Into<Key<'k>>,
        wildcard: impl Into<Key<'k>>,
        mode: WildcardMode,
    ) -> Result<Entries<'_, V, S>> {
        let template_symbols = self.to_symbols_probe(template)?;
        let wildcard_symbols = wildcard.into().into_symbols(self.key_type)?;
        if wildcard_symbols.len() != 1 {
            return Err(Error::InvalidArgument {
                reason: "wildcard must be exactly one symbol".into(),
            });
        }
        let items = iter_keys::collect_wildcard(&self.store, &template_symbols, wildcard_symbols[0], mode);
        Ok(Entries::new_flat(self, items))
    }

    /// Searches `input` for every occurrence of every stored key (spec.md
    /// §4.5). Requires `Phase::AhoCorasick` (call [`Self::finalize`]
    /// first), or fails with `WrongPhase`.
    pub fn search<'k>(&self, input: impl Into<Key<'k>>) -> Result<Search<'_, V, S>> {
        Search::new(self, input, None, false)
    }

    /// Like [`Self::search`], with `ignore_white_space` (spec.md §4.5,
    /// string keys only).
    pub fn search_with<'k>(&self, input: impl Into<Key<'k>>, ignore_white_space: bool) -> Result<Search<'_, V, S>> {
        Search::new(self, input, None, ignore_white_space)
    }

    /// Like [`Self::search`], restricted to the window `[start, end)` in
    /// `input` (spec.md §4.5 "Window arguments"). Negative bounds or
    /// `end > input.len()` fail with `IndexError`.
    pub fn search_in<'k>(
        &self,
        input: impl Into<Key<'k>>,
        start: i64,
        end: i64,
        ignore_white_space: bool,
    ) -> Result<Search<'_, V, S>> {
        Search::new(self, input, Some((start, end)), ignore_white_space)
    }

    /// Searches `input`, emitting only the longest non-overlapping match
    /// starting at each scan position (spec.md §4.5 "Longest-match
    /// variant").
    pub fn search_longest<'k>(&self, input: impl Into<Key<'k>>) -> Result<LongestMatch<'_, V, S>> {
        LongestMatch::new(self, input, None, false)
    }

    /// Windowed form of [`Self::search_longest`].
    pub fn search_longest_in<'k>(
        &self,
        input: impl Into<Key<'k>>,
        start: i64,
        end: i64,
        ignore_white_space: bool,
    ) -> Result<LongestMatch<'_, V, S>> {
        LongestMatch::new(self, input, Some((start, end)), ignore_white_space)
    }
}

impl<V, S: StateID> Default for AhoCorasick<V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateID> AhoCorasick<usize, S> {
    /// Inserts `key` with an automatically computed payload: the running
    /// insertion counter in `StoreMode::Integer`, or the key's length in
    /// `StoreMode::Length`. Fails with `TypeMismatch` in `StoreMode::Opaque`
    /// (see SPEC_FULL.md §4.6 for why this differs from the source
    /// language's runtime type check).
    pub fn add_auto<'a>(&mut self, key: impl Into<Key<'a>>) -> Result<bool> {
        let symbols = self.to_symbols(key)?;
        let value = self
            .values
            .next_auto(symbols.len())
            .ok_or_else(|| Error::TypeMismatch {
                reason: "add_auto requires StoreMode::Integer or StoreMode::Length".into(),
            })?;
        match self.key_type {
            KeyType::String => {
                let bytes: Vec<u8> = symbols.iter().map(|&s| s as u8).collect();
                self.add(Key::Bytes(&bytes), value)
            }
            KeyType::Sequence => self.add(Key::Sequence(&symbols), value),
        }
    }
}
