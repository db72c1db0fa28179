//! `acora`: a multi-pattern exact-match automaton.
//!
//! An [`AhoCorasick`] is a trie of inserted keys (a prefix tree with an
//! `Opaque`, `Integer`, or `Length` payload at every terminal node) that can
//! be [`finalize`][AhoCorasick::finalize]d into a full Aho-Corasick
//! automaton: failure links are computed once, after which
//! [`search`][AhoCorasick::search] finds every occurrence of every stored
//! key in a single pass over an input, and
//! [`search_longest`][AhoCorasick::search_longest] finds only the longest
//! non-overlapping match at each position. Before or after finalizing,
//! [`keys`][AhoCorasick::keys]/[`items`][AhoCorasick::items] enumerate the
//! dictionary itself, with optional prefix or single-wildcard filters.
//!
//! ```
//! use acora::AhoCorasick;
//!
//! let mut ac: AhoCorasick<usize> = AhoCorasick::new();
//! ac.add("he", 0).unwrap();
//! ac.add("she", 1).unwrap();
//! ac.add("his", 2).unwrap();
//! ac.add("hers", 3).unwrap();
//! ac.finalize();
//!
//! let matches: Vec<(usize, usize)> = ac
//!     .search("ushers")
//!     .unwrap()
//!     .map(|r| r.map(|(end, v)| (end, *v)).unwrap())
//!     .collect();
//! assert_eq!(matches, vec![(3, 1), (3, 0), (5, 3)]);
//! ```
//!
//! Keys may instead be sequences of integers rather than byte strings
//! ([`AhoCorasick::new_sequence`]), and the automaton can be persisted to
//! and restored from a byte stream ([`AhoCorasick::save`],
//! [`AhoCorasick::load`]).

mod automaton;
mod builder;
mod error;
mod finalize;
mod iter_keys;
mod node;
mod persist;
mod search;
mod state_id;
mod store;
mod symbol;
mod trie;
mod value;

pub use automaton::{AhoCorasick, Phase, Statistics};
pub use builder::AhoCorasickBuilder;
pub use error::{Error, Result};
pub use iter_keys::{Entries, WildcardMode};
pub use search::{LongestMatch, Search};
pub use symbol::{Key, KeyBuf, KeyType};
pub use value::StoreMode;
