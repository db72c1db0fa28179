//! Error types for the automaton.
//!
//! One variant per error name in the interface contract, following the
//! teacher pack's convention of a single `thiserror` enum per crate (see
//! `copyleftdev-mauka_mcp`'s `MaukaError` / `NiihauTrieError`).

use thiserror::Error;

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the trie builder, search iterators, key-enumeration
/// iterators, and the persistence layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup that promises existence found nothing (`pop`, `get` with no
    /// default supplied).
    #[error("key not found")]
    NotFound,

    /// The key was rejected before any mutation took place (currently: the
    /// empty key, which `add` never allows).
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// The key's kind didn't match the automaton's `KeyType`, or an
    /// integer/length auto-assignment was requested on an `Opaque`-mode
    /// automaton.
    #[error("type mismatch: {reason}")]
    TypeMismatch {
        /// Why the operation doesn't apply to this automaton's configuration.
        reason: String,
    },

    /// A sequence-key symbol (or persisted node/edge count) exceeded the
    /// representable range.
    #[error("value at index {index} is out of range")]
    OutOfRange {
        /// The offending index within the key (or record being decoded).
        index: usize,
    },

    /// A window bound was negative or past the end of the input.
    #[error("index out of bounds: {reason}")]
    IndexError {
        /// Human-readable explanation of which bound was violated.
        reason: String,
    },

    /// The requested operation isn't legal in the automaton's current phase.
    #[error("operation requires phase {expected:?}, automaton is in phase {actual:?}")]
    WrongPhase {
        /// The phase the operation required.
        expected: &'static str,
        /// The phase the automaton was actually in.
        actual: &'static str,
    },

    /// A live iterator observed a generation counter different from the one
    /// it captured at creation: the automaton was structurally mutated
    /// underneath it.
    #[error("iterator invalidated by a structural mutation")]
    Invalidated,

    /// A malformed argument was supplied (e.g. a multi-symbol wildcard).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// The persisted file was truncated, had a bad magic/version, or its
    /// internal indices didn't validate.
    #[error("corrupt input{}: {reason}", node_index.map(|i| format!(" at node {i}")).unwrap_or_default())]
    CorruptInput {
        /// The node index being decoded when the problem was found, if any.
        node_index: Option<u64>,
        /// Description of the problem.
        reason: String,
    },

    /// The node store's arena is full for its id representation: inserting
    /// another node would require an id past what `S` can represent
    /// (spec.md §7 "Resource exhaustion"). The automaton is left exactly as
    /// it was before the failed operation.
    #[error("node arena exhausted: no more ids available for this automaton's id width")]
    ArenaExhausted,

    /// Wraps the underlying I/O error for save/load.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(Error::NotFound.to_string(), "key not found");
        assert_eq!(
            Error::OutOfRange { index: 3 }.to_string(),
            "value at index 3 is out of range"
        );
        assert_eq!(
            Error::CorruptInput {
                node_index: Some(7),
                reason: "truncated edge table".into()
            }
            .to_string(),
            "corrupt input at node 7: truncated edge table"
        );
        assert_eq!(
            Error::CorruptInput {
                node_index: None,
                reason: "bad magic".into()
            }
            .to_string(),
            "corrupt input: bad magic"
        );
    }
}
