//! Build-time configuration for mappers.

use serde::{Deserialize, Serialize};

/// What to do when the input repeats a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the value of the first occurrence.
    #[default]
    KeepFirst,
    /// Keep the value of the last occurrence.
    KeepLast,
    /// Abort construction with
    /// [`BuildError::DuplicateKey`](crate::error::BuildError::DuplicateKey).
    Reject,
}

/// Configuration for [`MapperBuilder`](super::MapperBuilder).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// use mafsa_mapper::mapper::config::{DuplicatePolicy, MapperConfig};
///
/// let json = r#"{"duplicate_policy": "keep_last"}"#;
/// let config: MapperConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepLast);
/// assert!(!config.reload_through_codec);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Handling of repeated keys
    pub duplicate_policy: DuplicatePolicy,

    /// Encode the finished automaton and decode it again before returning.
    ///
    /// Construction-time allocations are released and the mapper starts
    /// from a freshly decoded, compactly allocated automaton. The encoded
    /// buffer is dropped before `build` returns.
    pub reload_through_codec: bool,

    /// Name of the key column reported by the input source
    pub from_field: Option<String>,

    /// Name of the value column reported by the input source
    pub to_field: Option<String>,
}
