//! Error types for automaton construction and decoding.
//!
//! Construction failures and decode failures are kept apart: a
//! [`BuildError`] means the caller fed the builder something it must not
//! accept, a [`DecodeError`] means a serialized automaton could not be
//! trusted. Looking up an absent key is never an error.

use thiserror::Error;

/// Errors that abort construction of an automaton or mapper.
///
/// No partially built automaton is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A key sorted strictly before the key inserted just before it.
    ///
    /// Keys must arrive in non-decreasing lexicographic order.
    #[error("key {key:?} inserted after {previous:?}: keys must be sorted")]
    OutOfOrder {
        /// The previously inserted key
        previous: String,
        /// The offending key
        key: String,
    },

    /// A key was inserted twice while duplicates are configured as errors.
    #[error("duplicate key {key:?}")]
    DuplicateKey {
        /// The repeated key
        key: String,
    },

    /// A raw input record was not valid UTF-8.
    #[error("record {record}: invalid UTF-8")]
    InvalidUtf8 {
        /// Zero-based record number
        record: usize,
        /// Underlying decoding failure
        #[source]
        source: std::str::Utf8Error,
    },

    /// The input collaborator reported a malformed record.
    #[error("record {record}: {message}")]
    Input {
        /// Zero-based record number
        record: usize,
        /// Description supplied by the producer
        message: String,
    },

    /// The automaton outgrew its 32-bit state, edge or key indices.
    #[error("capacity exceeded: too many {what}")]
    CapacityExceeded {
        /// Which quantity overflowed
        what: &'static str,
    },

    /// An earlier insertion failed; the builder cannot produce a mapper.
    #[error("construction aborted by an earlier error")]
    Aborted,

    /// A decoded automaton and its value store disagree on the key count.
    #[error("automaton holds {keys} keys but value store holds {values} values")]
    LengthMismatch {
        /// Keys accepted by the automaton
        keys: usize,
        /// Entries in the value store
        values: usize,
    },

    /// Writing the automaton while reloading it through its binary form.
    #[error("reload failed")]
    Encode(#[from] EncodeError),

    /// Re-reading the automaton while reloading it through its binary form.
    #[error("reload failed")]
    Decode(#[from] DecodeError),
}

/// Errors raised while writing a serialized automaton.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The destination writer failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The encoder rejected the payload.
    #[error("encoding failed")]
    Format(#[from] bincode::Error),
}

/// Errors raised while decoding a serialized automaton.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream ended early or could not be read.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The payload is not a valid encoding.
    #[error("malformed payload")]
    Format(#[from] bincode::Error),

    /// The stream does not start with the automaton magic bytes.
    #[error("not a serialized automaton (bad magic)")]
    BadMagic,

    /// The format version is not one this crate can read.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// The automaton was built over a different label unit.
    #[error("label unit width mismatch: expected {expected} bytes, found {found}")]
    UnitWidthMismatch {
        /// Width of the requested unit type
        expected: u8,
        /// Width recorded in the stream
        found: u8,
    },

    /// The graph decoded but violates an automaton invariant.
    #[error("corrupt automaton: {0}")]
    Corrupt(String),
}

/// A specialized `Result` type for construction.
pub type Result<T> = std::result::Result<T, BuildError>;
