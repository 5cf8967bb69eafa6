//! Binary serialization of frozen automata.
//!
//! The encoding is a small header followed by the state list, written with
//! bincode's variable-length integer options:
//!
//! ```text
//! Header { magic: b"MAFS", version: u8, unit_width: u8 }
//! Body   { key_count, root, states: [ { accepting, edges: [ { label, target, count } ] } ] }
//! ```
//!
//! States appear children-first: every edge target is a strictly smaller
//! index than the state holding the edge. A single linear pass can
//! therefore rebuild the automaton and check each stored count against the
//! counts already recomputed for its target, and the ordering alone proves
//! the decoded graph acyclic.
//!
//! # Example
//!
//! ```
//! use mafsa_mapper::automaton::builder::MinTreeBuilder;
//! use mafsa_mapper::automaton::min_tree::MinTree;
//!
//! let mut builder: MinTreeBuilder = MinTreeBuilder::new();
//! for key in ["test", "testing"] {
//!     builder.insert(key).unwrap();
//! }
//! let tree = builder.finish().unwrap();
//!
//! let bytes = tree.encode().unwrap();
//! let loaded: MinTree = MinTree::decode(&bytes).unwrap();
//! assert_eq!(loaded.lookup("testing"), Some(1));
//! ```

use crate::automaton::char_unit::CharUnit;
use crate::automaton::min_tree::{Edge, MinTree, StateEntry};
use crate::automaton::registry::{FrozenState, Registry};
use crate::error::{DecodeError, EncodeError};
use bincode::Options;
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::io::{Read, Write};

#[cfg(feature = "compression")]
mod compression_impl;

#[cfg(feature = "compression")]
pub use self::compression_impl::GzipCodec;

const MAGIC: [u8; 4] = *b"MAFS";
const FORMAT_VERSION: u8 = 1;

/// Trait for writing and reading frozen automata.
pub trait AutomatonSerializer {
    /// Serialize an automaton to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or writing fails.
    fn serialize<U, W>(tree: &MinTree<U>, writer: W) -> Result<(), EncodeError>
    where
        U: CharUnit,
        W: Write;

    /// Deserialize an automaton from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the stream does not hold a valid
    /// automaton over unit `U`. Nothing partial is returned.
    fn deserialize<U, R>(reader: R) -> Result<MinTree<U>, DecodeError>
    where
        U: CharUnit,
        R: Read;
}

/// The native binary codec.
pub struct BinaryCodec;

#[derive(Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u8,
    unit_width: u8,
}

#[derive(Serialize, Deserialize)]
struct Body {
    key_count: u32,
    root: u32,
    states: Vec<EncodedState>,
}

#[derive(Serialize, Deserialize)]
struct EncodedState {
    accepting: bool,
    edges: Vec<EncodedEdge>,
}

#[derive(Serialize, Deserialize)]
struct EncodedEdge {
    label: u32,
    target: u32,
    count: u32,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
}

impl AutomatonSerializer for BinaryCodec {
    fn serialize<U, W>(tree: &MinTree<U>, mut writer: W) -> Result<(), EncodeError>
    where
        U: CharUnit,
        W: Write,
    {
        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            unit_width: U::WIDTH,
        };

        let states = (0..tree.state_count() as u32)
            .map(|id| EncodedState {
                accepting: tree.is_accepting(id),
                edges: tree
                    .edges_of(id)
                    .iter()
                    .map(|edge| EncodedEdge {
                        label: edge.label.to_code(),
                        target: edge.target,
                        count: edge.count,
                    })
                    .collect(),
            })
            .collect();
        let body = Body {
            key_count: tree.len() as u32,
            root: tree.root_id(),
            states,
        };

        options().serialize_into(&mut writer, &header)?;
        options().serialize_into(&mut writer, &body)?;
        writer.flush()?;
        Ok(())
    }

    fn deserialize<U, R>(reader: R) -> Result<MinTree<U>, DecodeError>
    where
        U: CharUnit,
        R: Read,
    {
        read_tree(reader)
    }
}

/// Separate reader failures (truncation included) from malformed payloads.
fn decode_failure(err: bincode::Error) -> DecodeError {
    match *err {
        bincode::ErrorKind::Io(io) => DecodeError::Io(io),
        other => DecodeError::Format(Box::new(other)),
    }
}

/// Validate a decoded body and lay it out as a [`MinTree`].
///
/// States pass through a fresh [`Registry`] in stored order. A decoded
/// automaton has the same shape a built one has: edges point back to
/// earlier states, no two states are structurally identical, the root is
/// stored last and every other state is the target of some edge.
fn rebuild<U: CharUnit>(body: Body) -> Result<MinTree<U>, DecodeError> {
    let state_count = body.states.len();
    if state_count == 0 {
        return Err(DecodeError::Corrupt("no states".to_string()));
    }
    if body.root as usize != state_count - 1 {
        return Err(DecodeError::Corrupt(format!(
            "root {} is not the last of {} states",
            body.root, state_count
        )));
    }

    let edge_total: usize = body.states.iter().map(|s| s.edges.len()).sum();
    let mut registry: Registry<U> = Registry::new();
    let mut referenced = vec![false; state_count];
    let mut entries = Vec::with_capacity(state_count);
    let mut edges = Vec::with_capacity(edge_total);

    for (id, state) in body.states.into_iter().enumerate() {
        let mut count = u32::from(state.accepting);
        let mut frozen = FrozenState {
            edges: SmallVec::with_capacity(state.edges.len()),
            accepting: state.accepting,
        };
        let edge_offset = edges.len() as u32;
        let edge_len = state.edges.len() as u32;

        for encoded in state.edges {
            let label = U::from_code(encoded.label).ok_or_else(|| {
                DecodeError::Corrupt(format!("state {id}: invalid label {}", encoded.label))
            })?;
            if frozen.edges.last().is_some_and(|&(p, _)| p >= label) {
                return Err(DecodeError::Corrupt(format!(
                    "state {id}: edges not in ascending label order"
                )));
            }

            // Targets must precede their source; this also rules out cycles
            let target = encoded.target as usize;
            if target >= id {
                return Err(DecodeError::Corrupt(format!(
                    "state {id}: edge to state {target} is not a back reference"
                )));
            }
            let target_count = registry.count(encoded.target);
            if target_count == 0 {
                return Err(DecodeError::Corrupt(format!(
                    "state {id}: edge to state {target} leads to no key"
                )));
            }
            if encoded.count != target_count {
                return Err(DecodeError::Corrupt(format!(
                    "state {id}: edge count {} disagrees with target count {}",
                    encoded.count, target_count
                )));
            }
            count = count.checked_add(target_count).ok_or_else(|| {
                DecodeError::Corrupt(format!("state {id}: key count overflow"))
            })?;

            referenced[target] = true;
            frozen.edges.push((label, encoded.target));
            edges.push(Edge {
                label,
                target: encoded.target,
                count: target_count,
            });
        }

        // Ids are handed out in registration order, so a new state gets `id`
        let canonical = registry.register(frozen);
        if canonical as usize != id {
            return Err(DecodeError::Corrupt(format!("state {id} duplicates state {canonical}")));
        }
        debug_assert_eq!(registry.count(canonical), count);
        entries.push(StateEntry {
            edge_offset,
            edge_len,
            accepting: state.accepting,
        });
    }

    if let Some(orphan) = referenced[..state_count - 1].iter().position(|&r| !r) {
        return Err(DecodeError::Corrupt(format!("state {orphan} is unreachable")));
    }

    let root_count = registry.count(body.root);
    if root_count != body.key_count {
        return Err(DecodeError::Corrupt(format!(
            "header claims {} keys, root reaches {}",
            body.key_count, root_count
        )));
    }

    Ok(MinTree::from_parts(entries, edges, body.root, body.key_count))
}

/// Read a header and body from `reader`, leaving anything after the body
/// unread.
fn read_tree<U, R>(mut reader: R) -> Result<MinTree<U>, DecodeError>
where
    U: CharUnit,
    R: Read,
{
    let header: Header = options()
        .deserialize_from(&mut reader)
        .map_err(decode_failure)?;
    if header.magic != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    if header.version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(header.version));
    }
    if header.unit_width != U::WIDTH {
        return Err(DecodeError::UnitWidthMismatch {
            expected: U::WIDTH,
            found: header.unit_width,
        });
    }

    let body: Body = options()
        .deserialize_from(&mut reader)
        .map_err(decode_failure)?;
    let tree = rebuild(body)?;
    debug!(
        "decoded automaton: {} keys, {} states",
        tree.len(),
        tree.state_count()
    );
    Ok(tree)
}

impl<U: CharUnit> MinTree<U> {
    /// Encode this automaton into a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = Vec::new();
        BinaryCodec::serialize(self, &mut buffer)?;
        Ok(buffer)
    }

    /// Encode this automaton into a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), EncodeError> {
        BinaryCodec::serialize(self, writer)
    }

    /// Decode an automaton from a byte slice holding exactly one encoding.
    ///
    /// Bytes left over after the body are reported as
    /// [`DecodeError::Corrupt`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut rest = bytes;
        let tree = read_tree(&mut rest)?;
        if !rest.is_empty() {
            return Err(DecodeError::Corrupt(format!(
                "{} trailing bytes after the body",
                rest.len()
            )));
        }
        Ok(tree)
    }

    /// Decode an automaton from a reader, such as an open file.
    ///
    /// Reading stops at the end of the body, so the stream may carry other
    /// data after it.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, DecodeError> {
        BinaryCodec::deserialize(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::builder::MinTreeBuilder;

    fn build(keys: &[&str]) -> MinTree {
        let mut builder = MinTreeBuilder::new();
        for key in keys {
            builder.insert(key).unwrap();
        }
        builder.finish().unwrap()
    }

    fn encode_body(body: &Body) -> Vec<u8> {
        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            unit_width: <char as CharUnit>::WIDTH,
        };
        let mut buffer = Vec::new();
        options().serialize_into(&mut buffer, &header).unwrap();
        options().serialize_into(&mut buffer, body).unwrap();
        buffer
    }

    fn leaf_body(edge_count: u32, target: u32) -> Body {
        Body {
            key_count: 1,
            root: 1,
            states: vec![
                EncodedState {
                    accepting: true,
                    edges: Vec::new(),
                },
                EncodedState {
                    accepting: false,
                    edges: vec![EncodedEdge {
                        label: 'a' as u32,
                        target,
                        count: edge_count,
                    }],
                },
            ],
        }
    }

    fn state(accepting: bool, edges: &[(char, u32, u32)]) -> EncodedState {
        EncodedState {
            accepting,
            edges: edges
                .iter()
                .map(|&(label, target, count)| EncodedEdge {
                    label: label as u32,
                    target,
                    count,
                })
                .collect(),
        }
    }

    fn decode_body(body: &Body) -> Result<MinTree, DecodeError> {
        MinTree::decode(&encode_body(body))
    }

    #[test]
    fn test_roundtrip() {
        let keys = ["app", "apple", "apply", "banana", "band", "resting", "testing"];
        let tree = build(&keys);
        let loaded: MinTree = MinTree::decode(&tree.encode().unwrap()).unwrap();

        assert_eq!(loaded.len(), tree.len());
        assert_eq!(loaded.state_count(), tree.state_count());
        assert_eq!(loaded.edge_count(), tree.edge_count());
        for probe in keys.iter().chain(["ap", "appl", "bandana", ""].iter()) {
            assert_eq!(loaded.lookup(probe), tree.lookup(probe), "{probe}");
        }
    }

    #[test]
    fn test_roundtrip_empty() {
        let tree = build(&[]);
        let loaded: MinTree = MinTree::decode(&tree.encode().unwrap()).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.lookup(""), None);
    }

    #[test]
    fn test_handcrafted_body_decodes() {
        let loaded: MinTree = MinTree::decode(&encode_body(&leaf_body(1, 0))).unwrap();
        assert_eq!(loaded.lookup("a"), Some(0));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let bytes = build(&["alpha", "beta", "gamma"]).encode().unwrap();
        for cut in [0, 3, bytes.len() / 2, bytes.len() - 1] {
            let result: Result<MinTree, _> = MinTree::decode(&bytes[..cut]);
            assert!(
                matches!(result, Err(DecodeError::Io(_))),
                "cut at {cut} should fail with an I/O error"
            );
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = build(&["alpha"]).encode().unwrap();
        bytes[0] = b'X';
        let result: Result<MinTree, _> = MinTree::decode(&bytes);
        assert!(matches!(result, Err(DecodeError::BadMagic)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = build(&["alpha"]).encode().unwrap();
        bytes.extend_from_slice(b"GARBAGE-TRAILER");
        let result: Result<MinTree, _> = MinTree::decode(&bytes);
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_read_from_stops_after_body() {
        let mut bytes = build(&["alpha", "beta"]).encode().unwrap();
        let body_len = bytes.len();
        bytes.extend_from_slice(b"next record");

        let mut reader = &bytes[..];
        let loaded: MinTree = MinTree::read_from(&mut reader).unwrap();
        assert_eq!(loaded.lookup("beta"), Some(1));
        assert_eq!(reader, &b"next record"[..]);
        assert_eq!(bytes.len() - reader.len(), body_len);
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = build(&["alpha"]).encode().unwrap();
        bytes[4] = 9;
        let result: Result<MinTree, _> = MinTree::decode(&bytes);
        assert!(matches!(result, Err(DecodeError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_unit_width_mismatch() {
        let bytes = build(&["alpha"]).encode().unwrap();
        let result: Result<MinTree<u8>, _> = MinTree::decode(&bytes);
        assert!(matches!(
            result,
            Err(DecodeError::UnitWidthMismatch {
                expected: 1,
                found: 4
            })
        ));
    }

    #[test]
    fn test_forward_reference_rejected() {
        // State 1 pointing at itself would be a cycle
        let result: Result<MinTree, _> = MinTree::decode(&encode_body(&leaf_body(1, 1)));
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let result: Result<MinTree, _> = MinTree::decode(&encode_body(&leaf_body(5, 0)));
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_key_count_mismatch_rejected() {
        let mut body = leaf_body(1, 0);
        body.key_count = 2;
        let result: Result<MinTree, _> = MinTree::decode(&encode_body(&body));
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_unsorted_edges_rejected() {
        let body = Body {
            key_count: 2,
            root: 1,
            states: vec![
                EncodedState {
                    accepting: true,
                    edges: Vec::new(),
                },
                EncodedState {
                    accepting: false,
                    edges: vec![
                        EncodedEdge {
                            label: 'b' as u32,
                            target: 0,
                            count: 1,
                        },
                        EncodedEdge {
                            label: 'a' as u32,
                            target: 0,
                            count: 1,
                        },
                    ],
                },
            ],
        };
        let result: Result<MinTree, _> = MinTree::decode(&encode_body(&body));
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_root_not_last_rejected() {
        let body = Body {
            key_count: 1,
            root: 2,
            states: vec![
                state(true, &[]),
                state(true, &[]),
                state(false, &[('a', 0, 1)]),
                state(false, &[('b', 1, 1)]),
            ],
        };
        assert!(matches!(decode_body(&body), Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_duplicate_states_rejected() {
        let body = Body {
            key_count: 2,
            root: 2,
            states: vec![
                state(true, &[]),
                state(true, &[]),
                state(false, &[('a', 0, 1), ('b', 1, 1)]),
            ],
        };
        match decode_body(&body) {
            Err(DecodeError::Corrupt(message)) => assert!(message.contains("duplicates")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_state_rejected() {
        let body = Body {
            key_count: 1,
            root: 2,
            states: vec![
                state(true, &[]),
                state(false, &[('x', 0, 1)]),
                state(false, &[('a', 0, 1)]),
            ],
        };
        match decode_body(&body) {
            Err(DecodeError::Corrupt(message)) => assert!(message.contains("unreachable")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_edge_to_dead_state_rejected() {
        let body = Body {
            key_count: 0,
            root: 1,
            states: vec![state(false, &[]), state(false, &[('a', 0, 0)])],
        };
        assert!(matches!(decode_body(&body), Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let mut body = leaf_body(1, 0);
        body.states[1].edges[0].label = 0xD800;
        let result: Result<MinTree, _> = MinTree::decode(&encode_body(&body));
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_read_from_file() {
        use std::io::{Seek, SeekFrom};

        let tree = build(&["one", "three", "two"]);
        let mut file = scratch_file();
        tree.write_to(&mut file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let loaded: MinTree = MinTree::read_from(&mut file).unwrap();
        assert_eq!(loaded.lookup("two"), Some(2));
    }

    fn scratch_file() -> std::fs::File {
        let path = std::env::temp_dir().join(format!(
            "mafsa-mapper-codec-{}-{:?}.bin",
            std::process::id(),
            std::thread::current().id()
        ));
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        std::fs::remove_file(&path).ok();
        file
    }
}
