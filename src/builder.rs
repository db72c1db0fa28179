//! Construction options (spec.md §6, "enumerated, exhaustive"): store mode
//! and key type. The idiomatic-Rust realization of that enumeration is a
//! small builder, in the style common across the teacher pack's
//! configuration types (e.g. `NiihauTrieConfig`).

use crate::automaton::AhoCorasick;
use crate::state_id::StateID;
use crate::symbol::KeyType;
use crate::value::StoreMode;

/// Builds an [`AhoCorasick`] with non-default construction options.
///
/// ```
/// use acora::{AhoCorasickBuilder, KeyType, StoreMode};
///
/// let ac = AhoCorasickBuilder::new()
///     .store(StoreMode::Length)
///     .key_type(KeyType::String)
///     .build::<usize>();
/// assert_eq!(ac.store_mode(), StoreMode::Length);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AhoCorasickBuilder {
    store: StoreMode,
    key_type: KeyType,
}

impl AhoCorasickBuilder {
    pub fn new() -> Self {
        AhoCorasickBuilder {
            store: StoreMode::Opaque,
            key_type: KeyType::String,
        }
    }

    pub fn store(mut self, mode: StoreMode) -> Self {
        self.store = mode;
        self
    }

    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// Builds the automaton with `u32` node ids (the default arena width).
    pub fn build<V>(self) -> AhoCorasick<V> {
        AhoCorasick::with_options(self.store, self.key_type)
    }

    /// Builds the automaton with an explicit node-id representation, for
    /// dictionaries expected to stay within a narrower id space.
    pub fn build_with_id<V, S: StateID>(self) -> AhoCorasick<V, S> {
        AhoCorasick::with_options(self.store, self.key_type)
    }
}

impl Default for AhoCorasickBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_options() {
        let ac = AhoCorasickBuilder::new()
            .store(StoreMode::Integer)
            .key_type(KeyType::Sequence)
            .build::<usize>();
        assert_eq!(ac.store_mode(), StoreMode::Integer);
        assert_eq!(ac.key_type(), KeyType::Sequence);
    }
}
