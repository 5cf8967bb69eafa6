//! Gzip framing around an encoded automaton.
//!
//! The decompressed stream is byte-for-byte what the inner codec writes:
//! the `MAFS` header followed by the children-first state list. Edge counts
//! and targets are small varints that repeat across sibling states, so the
//! body usually shrinks severalfold.

use super::{AutomatonSerializer, BinaryCodec};
use crate::automaton::char_unit::CharUnit;
use crate::automaton::min_tree::MinTree;
use crate::error::{DecodeError, EncodeError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::io::{Read, Write};
use std::marker::PhantomData;

/// A codec that gzips the output of another codec, [`BinaryCodec`] by
/// default.
///
/// # Example
///
/// ```
/// use mafsa_mapper::prelude::*;
///
/// let mut builder: MinTreeBuilder = MinTreeBuilder::new();
/// for key in ["alpha", "alphabet", "beta"] {
///     builder.insert(key).unwrap();
/// }
/// let tree = builder.finish().unwrap();
///
/// let mut packed = Vec::new();
/// GzipCodec::<BinaryCodec>::serialize(&tree, &mut packed).unwrap();
/// let loaded: MinTree = GzipCodec::<BinaryCodec>::deserialize(&packed[..]).unwrap();
/// assert_eq!(loaded.lookup("alphabet"), Some(1));
/// ```
pub struct GzipCodec<S = BinaryCodec> {
    _inner: PhantomData<fn() -> S>,
}

impl<S: AutomatonSerializer> AutomatonSerializer for GzipCodec<S> {
    fn serialize<U, W>(tree: &MinTree<U>, writer: W) -> Result<(), EncodeError>
    where
        U: CharUnit,
        W: Write,
    {
        let mut gz = GzEncoder::new(writer, Compression::default());
        S::serialize(tree, &mut gz)?;
        gz.finish()?;
        debug!("wrote gzip frame for {} states", tree.state_count());
        Ok(())
    }

    fn deserialize<U, R>(reader: R) -> Result<MinTree<U>, DecodeError>
    where
        U: CharUnit,
        R: Read,
    {
        S::deserialize(GzDecoder::new(reader))
    }
}
