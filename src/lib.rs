//! # mafsa-mapper
//!
//! Compact read-only string maps built on minimal acyclic automata.
//!
//! Keys supplied in sorted order are compiled into a minimal deterministic
//! acyclic automaton in a single incremental pass. Every edge records how
//! many keys lie beyond it, so walking a key also yields its rank among all
//! stored keys; values live in a flat array indexed by that rank. Shared
//! prefixes and shared suffixes are each stored once.
//!
//! The construction follows:
//!
//! > Daciuk, Jan, Stoyan Mihov, Bruce W. Watson, and Richard E. Watson.
//! > "Incremental construction of minimal acyclic finite-state automata."
//! > Computational Linguistics 26.1 (2000): 3-16.
//!
//! ## Example
//!
//! ```
//! use mafsa_mapper::prelude::*;
//!
//! let mut builder = MapperBuilder::new();
//! builder.insert("10001", "New York".to_string()).unwrap();
//! builder.insert("60601", "Chicago".to_string()).unwrap();
//! builder.insert("94105", "San Francisco".to_string()).unwrap();
//! let mapper = builder.build().unwrap();
//!
//! assert_eq!(mapper.get("60601").map(String::as_str), Some("Chicago"));
//! assert_eq!(mapper.get("00000"), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod automaton;
pub mod error;
pub mod mapper;
pub mod serialization;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::automaton::builder::MinTreeBuilder;
    pub use crate::automaton::char_unit::CharUnit;
    pub use crate::automaton::min_tree::MinTree;
    pub use crate::automaton::{Automaton, AutomatonNode};
    pub use crate::error::{BuildError, DecodeError, EncodeError};
    pub use crate::mapper::config::{DuplicatePolicy, MapperConfig};
    pub use crate::mapper::hash_mapper::HashMapper;
    pub use crate::mapper::value_store::ValueStore;
    pub use crate::mapper::{MafsaMapper, Mapper, MapperBuilder};
    pub use crate::serialization::{AutomatonSerializer, BinaryCodec};

    #[cfg(feature = "compression")]
    pub use crate::serialization::GzipCodec;
}
