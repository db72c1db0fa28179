//! The alphabet shared by every component: a `Symbol` is a single edge
//! label, a `Key` is the caller-facing sequence of them.
//!
//! Per DESIGN.md's resolution of spec.md §3's Open Question, both key kinds
//! are represented uniformly as `u32` symbols internally: STRING keys use
//! the raw byte value, SEQUENCE keys use the caller's integers directly.

use crate::error::{Error, Result};

/// A single edge label in the trie/automaton.
pub(crate) type Symbol = u32;

/// The largest symbol value a SEQUENCE key may use (the implementation
/// bound spec.md §6 calls for, "16-bit minimum, 32-bit recommended").
/// Symbols and node ids are independent address spaces (a symbol is an edge
/// label, not a `StateID`), so this doesn't need to dodge the node store's
/// own nil sentinel (`state_id::nil_id`); one value below `u32::MAX` is
/// reserved purely so `MAX_SEQUENCE_SYMBOL + 1` doesn't overflow.
pub const MAX_SEQUENCE_SYMBOL: u32 = u32::MAX - 1;

/// Which alphabet an automaton's keys are drawn from. Fixed for the
/// lifetime of an automaton (spec.md §3: "key kind is fixed at creation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Keys are sequences of UTF-8 bytes.
    String,
    /// Keys are sequences of non-negative integers bounded by
    /// [`MAX_SEQUENCE_SYMBOL`].
    Sequence,
}

/// A caller-supplied key, tagged with which alphabet it's drawn from.
///
/// Use [`Key::from`] for the common `&str` case, or construct
/// `Key::Sequence` directly for integer-sequence keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    /// A byte-string key (STRING key type).
    Bytes(&'a [u8]),
    /// An integer-sequence key (SEQUENCE key type).
    Sequence(&'a [u32]),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Key::Bytes(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Key<'a> {
    fn from(b: &'a [u8]) -> Self {
        Key::Bytes(b)
    }
}

impl<'a> From<&'a [u32]> for Key<'a> {
    fn from(s: &'a [u32]) -> Self {
        Key::Sequence(s)
    }
}

impl<'a> Key<'a> {
    pub(crate) fn key_type(&self) -> KeyType {
        match self {
            Key::Bytes(_) => KeyType::String,
            Key::Sequence(_) => KeyType::Sequence,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Key::Bytes(b) => b.len(),
            Key::Sequence(s) => s.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validates this key against `expected` and converts it to a symbol
    /// sequence, or fails with `TypeMismatch`/`OutOfRange`.
    pub(crate) fn into_symbols(self, expected: KeyType) -> Result<Vec<Symbol>> {
        if self.key_type() != expected {
            return Err(Error::TypeMismatch {
                reason: format!(
                    "automaton expects {:?} keys, got {:?}",
                    expected,
                    self.key_type()
                ),
            });
        }
        match self {
            Key::Bytes(b) => Ok(b.iter().map(|&byte| byte as Symbol).collect()),
            Key::Sequence(s) => {
                for (index, &value) in s.iter().enumerate() {
                    if value > MAX_SEQUENCE_SYMBOL {
                        return Err(Error::OutOfRange { index });
                    }
                }
                Ok(s.to_vec())
            }
        }
    }
}

/// An owned key reconstructed by a key-enumeration iterator (spec.md
/// §4.4 `keys()`/`items()`): the path spelled out from root to a
/// terminal, materialized in whichever alphabet the automaton uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBuf {
    /// A STRING-keyed automaton's key, as raw bytes.
    Bytes(Vec<u8>),
    /// A SEQUENCE-keyed automaton's key.
    Sequence(Vec<u32>),
}

impl KeyBuf {
    pub(crate) fn from_symbols(key_type: KeyType, symbols: &[Symbol]) -> KeyBuf {
        match key_type {
            KeyType::String => KeyBuf::Bytes(symbols.iter().map(|&s| s as u8).collect()),
            KeyType::Sequence => KeyBuf::Sequence(symbols.to_vec()),
        }
    }

    /// The raw bytes of a STRING key, or `None` for a SEQUENCE key.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            KeyBuf::Bytes(b) => Some(b),
            KeyBuf::Sequence(_) => None,
        }
    }

    /// The symbols of a SEQUENCE key, or `None` for a STRING key.
    pub fn as_sequence(&self) -> Option<&[u32]> {
        match self {
            KeyBuf::Sequence(s) => Some(s),
            KeyBuf::Bytes(_) => None,
        }
    }

    /// Renders a STRING key as UTF-8, replacing invalid sequences; a
    /// SEQUENCE key is rendered as its `Debug` list.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        match self {
            KeyBuf::Bytes(b) => String::from_utf8_lossy(b),
            KeyBuf::Sequence(s) => std::borrow::Cow::Owned(format!("{:?}", s)),
        }
    }
}

/// Returns whether `symbol` is whitespace, for the `ignore_white_space`
/// search flag (STRING keys only). Covers the minimum set spec.md §4.5
/// calls out: space, tab, newline, carriage return; plus vertical tab and
/// form feed, which `u8::is_ascii_whitespace` also includes.
pub(crate) fn is_whitespace_symbol(symbol: Symbol) -> bool {
    symbol <= u8::MAX as Symbol && (symbol as u8).is_ascii_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_becomes_byte_symbols() {
        let symbols = Key::from("he").into_symbols(KeyType::String).unwrap();
        assert_eq!(symbols, vec![b'h' as u32, b'e' as u32]);
    }

    #[test]
    fn key_type_mismatch_is_rejected() {
        let seq = [1u32, 2, 3];
        let err = Key::Sequence(&seq).into_symbols(KeyType::String).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn out_of_range_sequence_symbol_is_rejected() {
        let seq = [1u32, u32::MAX];
        let err = Key::Sequence(&seq)
            .into_symbols(KeyType::Sequence)
            .unwrap_err();
        assert_eq!(err, Error::OutOfRange { index: 1 });
    }

    #[test]
    fn whitespace_detection() {
        assert!(is_whitespace_symbol(b' ' as u32));
        assert!(is_whitespace_symbol(b'\t' as u32));
        assert!(!is_whitespace_symbol(b'x' as u32));
    }
}
