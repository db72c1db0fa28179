//! Binary persistence (spec.md §6): serializes an automaton's trie
//! structure and payloads to a byte stream, and rebuilds an equivalent
//! automaton from one.
//!
//! The on-disk layout is this crate's own invention (spec.md doesn't
//! mandate a wire format, only round-trip equivalence) rather than a port
//! of any source-language pickle format: a small header, then one fixed
//! record per node in depth-first order (node ids renumbered 1..=N so the
//! file doesn't depend on the arena's internal, free-list-reused ids),
//! then a trailer of length-prefixed payload blobs produced by the
//! caller's serializer. Every payload — `Opaque`, `Integer`, and `Length`
//! modes alike — goes through the trailer and the caller's callback; the
//! node record only ever stores a trailer index, which keeps this module
//! free of any `V: Into<u64>`-style bound on the payload type.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::automaton::{AhoCorasick, Phase};
use crate::error::{Error, Result};
use crate::state_id::StateID;
use crate::store::NodeStore;
use crate::symbol::{KeyType, Symbol};
use crate::value::{StoreMode, ValueStore};

const MAGIC: [u8; 4] = *b"ACR1";
const FORMAT_VERSION: u32 = 1;

fn io_err(e: std::io::Error) -> Error {
    Error::Io(e.to_string())
}

fn corrupt(node_index: Option<u64>, reason: impl Into<String>) -> Error {
    Error::CorruptInput {
        node_index,
        reason: reason.into(),
    }
}

fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v]).map_err(io_err)
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes()).map_err(io_err)
}

fn write_u64<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&v.to_le_bytes()).map_err(io_err)
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf).map_err(io_err)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(io_err)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).map_err(io_err)?;
    Ok(u64::from_le_bytes(buf))
}

fn key_type_tag(kt: KeyType) -> u8 {
    match kt {
        KeyType::String => 0,
        KeyType::Sequence => 1,
    }
}

fn key_type_untag(tag: u8) -> Result<KeyType> {
    match tag {
        0 => Ok(KeyType::String),
        1 => Ok(KeyType::Sequence),
        _ => Err(corrupt(None, format!("unknown key type tag {tag}"))),
    }
}

fn store_mode_tag(mode: StoreMode) -> u8 {
    match mode {
        StoreMode::Opaque => 0,
        StoreMode::Integer => 1,
        StoreMode::Length => 2,
    }
}

fn store_mode_untag(tag: u8) -> Result<StoreMode> {
    match tag {
        0 => Ok(StoreMode::Opaque),
        1 => Ok(StoreMode::Integer),
        2 => Ok(StoreMode::Length),
        _ => Err(corrupt(None, format!("unknown store mode tag {tag}"))),
    }
}

fn phase_tag(phase: Phase) -> u8 {
    phase as u8
}

fn phase_untag(tag: u8) -> Result<Phase> {
    match tag {
        0 => Ok(Phase::Empty),
        1 => Ok(Phase::Trie),
        2 => Ok(Phase::AhoCorasick),
        _ => Err(corrupt(None, format!("unknown phase tag {tag}"))),
    }
}

/// A node record as read from disk, with every cross-reference still a
/// 1-based file-local serial rather than a resolved `S`.
struct RawNode {
    terminal: bool,
    value_index: Option<u64>,
    fail_serial: u64,
    edges: Vec<(Symbol, u64)>,
}

impl<V, S: StateID> AhoCorasick<V, S> {
    /// Writes this automaton to `writer` (spec.md §6 "Persistence
    /// interface"). `serialize_value` converts a payload to its byte
    /// representation; it's called once per stored key, in an unspecified
    /// but stable order.
    pub fn save<W: Write>(
        &self,
        mut writer: W,
        mut serialize_value: impl FnMut(&V) -> Vec<u8>,
    ) -> Result<()> {
        let (order, serial_of) = self.depth_first_serials();

        let mut trailer: Vec<Vec<u8>> = Vec::new();
        let mut records: Vec<(bool, Option<u64>, u64, Vec<(Symbol, u64)>)> = Vec::with_capacity(order.len());
        for &node in &order {
            let terminal = self.is_terminal(node);
            let value_index = if terminal {
                let value = self.payload(node).expect("terminal node must have a payload");
                let index = trailer.len() as u64;
                trailer.push(serialize_value(value));
                Some(index)
            } else {
                None
            };
            let fail = self.fail_of(node);
            let fail_serial = serial_of.get(&fail).copied().unwrap_or(0);
            let edges = self
                .edges_of(node)
                .into_iter()
                .map(|(symbol, child)| (symbol, serial_of[&child]))
                .collect();
            records.push((terminal, value_index, fail_serial, edges));
        }

        writer.write_all(&MAGIC).map_err(io_err)?;
        write_u32(&mut writer, FORMAT_VERSION)?;
        write_u8(&mut writer, key_type_tag(self.key_type))?;
        write_u8(&mut writer, store_mode_tag(self.store_mode()))?;
        write_u8(&mut writer, phase_tag(self.phase))?;
        write_u64(&mut writer, self.key_count as u64)?;
        write_u64(&mut writer, self.longest_key as u64)?;
        write_u64(&mut writer, 0)?; // reserved
        write_u64(&mut writer, order.len() as u64)?;

        for (terminal, value_index, fail_serial, edges) in &records {
            write_u8(&mut writer, *terminal as u8)?;
            write_u64(&mut writer, value_index.map(|i| i + 1).unwrap_or(0))?;
            write_u64(&mut writer, *fail_serial)?;
            write_u32(&mut writer, edges.len() as u32)?;
            for &(symbol, child_serial) in edges {
                write_u32(&mut writer, symbol)?;
                write_u64(&mut writer, child_serial)?;
            }
        }

        write_u64(&mut writer, trailer.len() as u64)?;
        for blob in &trailer {
            write_u64(&mut writer, blob.len() as u64)?;
            writer.write_all(blob).map_err(io_err)?;
        }

        tracing::debug!(nodes = order.len(), keys = self.key_count, "saved automaton");
        Ok(())
    }

    /// Convenience wrapper around [`Self::save`] that writes directly to
    /// `path` (spec.md §4.8: `save(path, serialize_value)`), buffering the
    /// file writes the way the rest of the crate buffers I/O.
    pub fn save_to_path(
        &self,
        path: impl AsRef<Path>,
        serialize_value: impl FnMut(&V) -> Vec<u8>,
    ) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(io_err)?;
        self.save(BufWriter::new(file), serialize_value)
    }

    /// Depth-first visit order from the root, alongside the 1-based serial
    /// each visited node is assigned (serial 0 is reserved to mean "no
    /// node": an undefined fail link, in particular).
    fn depth_first_serials(&self) -> (Vec<S>, HashMap<S, u64>) {
        let mut order = Vec::new();
        let mut serial_of = HashMap::new();
        let mut stack = vec![self.root_id()];
        // Pre-order: a node is assigned its serial, and pushed onto
        // `order`, the moment it's popped, before its children are pushed.
        while let Some(node) = stack.pop() {
            if serial_of.contains_key(&node) {
                continue;
            }
            serial_of.insert(node, order.len() as u64 + 1);
            order.push(node);
            for (_, child) in self.edges_of(node).into_iter().rev() {
                stack.push(child);
            }
        }
        (order, serial_of)
    }
}

impl<V, S: StateID> AhoCorasick<V, S> {
    /// Reconstructs an automaton from bytes written by [`Self::save`]
    /// (spec.md §6). `deserialize_value` is the inverse of the
    /// `serialize_value` callback used to write the file.
    pub fn load<R: Read>(
        mut reader: R,
        mut deserialize_value: impl FnMut(&[u8]) -> Result<V>,
    ) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(io_err)?;
        if magic != MAGIC {
            return Err(corrupt(None, "bad magic number"));
        }
        let version = read_u32(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(corrupt(
                None,
                format!("unsupported format version {version}"),
            ));
        }

        let key_type = key_type_untag(read_u8(&mut reader)?)?;
        let store_mode = store_mode_untag(read_u8(&mut reader)?)?;
        let phase = phase_untag(read_u8(&mut reader)?)?;
        let key_count = read_u64(&mut reader)? as usize;
        let longest_key = read_u64(&mut reader)? as usize;
        let _reserved = read_u64(&mut reader)?;
        let node_count = read_u64(&mut reader)?;

        let mut raw_nodes = Vec::with_capacity(node_count as usize);
        for serial in 1..=node_count {
            let terminal = read_u8(&mut reader)? != 0;
            let value_index_raw = read_u64(&mut reader)?;
            let value_index = if value_index_raw == 0 {
                None
            } else {
                Some(value_index_raw - 1)
            };
            if terminal != value_index.is_some() {
                return Err(corrupt(
                    Some(serial),
                    "terminal flag and payload-index presence disagree",
                ));
            }
            let fail_serial = read_u64(&mut reader)?;
            if fail_serial > node_count {
                return Err(corrupt(Some(serial), "fail link out of range"));
            }
            let edge_count = read_u32(&mut reader)?;
            let mut edges = Vec::with_capacity(edge_count as usize);
            for _ in 0..edge_count {
                let symbol = read_u32(&mut reader)?;
                let child_serial = read_u64(&mut reader)?;
                if child_serial == 0 || child_serial > node_count {
                    return Err(corrupt(Some(serial), "edge target out of range"));
                }
                edges.push((symbol, child_serial));
            }
            raw_nodes.push(RawNode {
                terminal,
                value_index,
                fail_serial,
                edges,
            });
        }

        let value_count = read_u64(&mut reader)?;
        let mut trailer: Vec<V> = Vec::with_capacity(value_count as usize);
        for i in 0..value_count {
            let len = read_u64(&mut reader)? as usize;
            let mut blob = vec![0u8; len];
            reader.read_exact(&mut blob).map_err(io_err)?;
            trailer.push(deserialize_value(&blob).map_err(|e| {
                corrupt(Some(i), format!("payload {i} failed to deserialize: {e}"))
            })?);
        }

        if node_count == 0 {
            return Err(corrupt(None, "file has no nodes, not even a root"));
        }

        let mut store: NodeStore<S> = NodeStore::new();
        let mut serial_to_id: HashMap<u64, S> = HashMap::new();
        serial_to_id.insert(1, store.root());
        for serial in 2..=node_count {
            let id = store
                .alloc()
                .ok_or_else(|| corrupt(Some(serial), "too many nodes for this id width"))?;
            serial_to_id.insert(serial, id);
        }

        let mut trailer = trailer.into_iter();
        let mut values: ValueStore<V> = ValueStore::new(store_mode);
        let mut observed_keys = 0usize;

        for (i, raw) in raw_nodes.iter().enumerate() {
            let serial = i as u64 + 1;
            let node_id = serial_to_id[&serial];
            for &(symbol, child_serial) in &raw.edges {
                let child_id = serial_to_id[&child_serial];
                store.get_mut(node_id).edges_mut().set(symbol, child_id);
            }
            store.get_mut(node_id).set_terminal(raw.terminal);
            if raw.fail_serial != 0 {
                let fail_id = serial_to_id[&raw.fail_serial];
                store.get_mut(node_id).set_fail(fail_id);
            }
            if raw.terminal {
                let value = trailer
                    .next()
                    .ok_or_else(|| corrupt(Some(serial), "missing payload in trailer"))?;
                values.set(node_id, value);
                observed_keys += 1;
            }
        }

        if observed_keys != key_count {
            return Err(corrupt(
                None,
                format!("header claims {key_count} keys, found {observed_keys}"),
            ));
        }

        recompute_depths(&mut store);
        values.set_next_integer(key_count);

        tracing::debug!(nodes = node_count, keys = key_count, "loaded automaton");

        Ok(AhoCorasick {
            store,
            values,
            key_type,
            phase,
            generation: 0,
            key_count,
            longest_key,
            _marker: std::marker::PhantomData,
        })
    }

    /// Convenience wrapper around [`Self::load`] that reads directly from
    /// `path` (spec.md §4.8: `load(path, deserialize_value)`).
    pub fn load_from_path(
        path: impl AsRef<Path>,
        deserialize_value: impl FnMut(&[u8]) -> Result<V>,
    ) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(io_err)?;
        Self::load(BufReader::new(file), deserialize_value)
    }
}

/// Depth isn't persisted (it's a pure function of the tree shape), so it's
/// recomputed with one BFS pass after loading.
fn recompute_depths<S: StateID>(store: &mut NodeStore<S>) {
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(store.root());
    while let Some(node) = queue.pop_front() {
        let depth = store.get(node).depth();
        let children: Vec<S> = store.get(node).edges().iter().map(|(_, c)| c).collect();
        for child in children {
            store.get_mut(child).set_depth(depth + 1);
            queue.push_back(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AhoCorasick;

    fn roundtrip<V: Clone + PartialEq + std::fmt::Debug>(
        ac: &AhoCorasick<V>,
        serialize: impl FnMut(&V) -> Vec<u8>,
        mut deserialize: impl FnMut(&[u8]) -> Result<V>,
    ) -> AhoCorasick<V> {
        let mut bytes = Vec::new();
        ac.save(&mut bytes, serialize).unwrap();
        AhoCorasick::load(&bytes[..], |b| deserialize(b)).unwrap()
    }

    #[test]
    fn round_trips_trie_phase() {
        let mut ac: AhoCorasick<i32> = AhoCorasick::new();
        for (w, v) in [("he", 1), ("hers", 2), ("his", 3)] {
            ac.add(w, v).unwrap();
        }
        let loaded = roundtrip(
            &ac,
            |v| v.to_le_bytes().to_vec(),
            |b| Ok(i32::from_le_bytes(b.try_into().unwrap())),
        );
        assert_eq!(loaded.phase(), ac.phase());
        assert_eq!(loaded.len(), ac.len());
        assert_eq!(*loaded.get("hers").unwrap(), 2);
    }

    #[test]
    fn round_trips_finalized_automaton_and_search_works() {
        let mut ac: AhoCorasick<i32> = AhoCorasick::new();
        for (w, v) in [("he", 1), ("she", 2), ("his", 3)] {
            ac.add(w, v).unwrap();
        }
        ac.finalize();
        let mut loaded = roundtrip(
            &ac,
            |v| v.to_le_bytes().to_vec(),
            |b| Ok(i32::from_le_bytes(b.try_into().unwrap())),
        );
        assert_eq!(loaded.phase(), Phase::AhoCorasick);
        let got: Vec<(usize, i32)> = loaded
            .search("ushershe")
            .unwrap()
            .map(|r| r.map(|(i, v)| (i, *v)).unwrap())
            .collect();
        assert_eq!(got, vec![(3, 1), (6, 2)]);
        // a loaded automaton is still mutable like any other.
        assert!(loaded.add("xyz", 9).is_ok());
    }

    #[test]
    fn round_trips_integer_auto_mode_and_resumes_counter() {
        let mut ac: AhoCorasick<usize> =
            AhoCorasick::with_options(StoreMode::Integer, KeyType::String);
        ac.add_auto("a").unwrap();
        ac.add_auto("bb").unwrap();
        let mut loaded = roundtrip(
            &ac,
            |v| (*v as u64).to_le_bytes().to_vec(),
            |b| Ok(u64::from_le_bytes(b.try_into().unwrap()) as usize),
        );
        assert_eq!(loaded.store_mode(), StoreMode::Integer);
        assert_eq!(loaded.add_auto("ccc").unwrap(), true);
        assert_eq!(*loaded.get("ccc").unwrap(), 2);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0u8; 32];
        let result: Result<AhoCorasick<i32>> = AhoCorasick::load(&bytes[..], |_| Ok(0));
        assert!(matches!(result, Err(Error::CorruptInput { .. })));
    }

    #[test]
    fn save_to_path_and_load_from_path_round_trip() {
        let mut ac: AhoCorasick<i32> = AhoCorasick::new();
        for (w, v) in [("he", 1), ("she", 2), ("hers", 3)] {
            ac.add(w, v).unwrap();
        }
        ac.finalize();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.acr");
        ac.save_to_path(&path, |v| v.to_le_bytes().to_vec()).unwrap();

        let loaded: AhoCorasick<i32> =
            AhoCorasick::load_from_path(&path, |b| Ok(i32::from_le_bytes(b.try_into().unwrap())))
                .unwrap();
        assert_eq!(loaded.phase(), Phase::AhoCorasick);
        assert_eq!(loaded.len(), ac.len());
        assert_eq!(*loaded.get("hers").unwrap(), 3);
    }

    #[test]
    fn load_from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.acr");
        let result: Result<AhoCorasick<i32>> = AhoCorasick::load_from_path(&path, |_| Ok(0));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
