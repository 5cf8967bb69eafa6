//! Hash-map backed mapper used as a baseline.

use super::Mapper;
use std::collections::HashMap;

/// A [`Mapper`] over a plain `HashMap`.
///
/// Answers the same queries as [`MafsaMapper`](super::MafsaMapper) and
/// accepts input in any order, at the cost of storing every key in full.
/// Useful for comparing memory use and for cross-checking results.
#[derive(Clone, Debug, Default)]
pub struct HashMapper<V = String> {
    map: HashMap<String, V>,
}

impl<V> HashMapper<V> {
    /// Create an empty mapper.
    pub fn new() -> Self {
        HashMapper {
            map: HashMap::new(),
        }
    }

    /// Build from `(key, value)` pairs; a repeated key keeps its first value.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let mut map = HashMap::new();
        for (key, value) in pairs {
            map.entry(key.into()).or_insert(value);
        }
        HashMapper { map }
    }
}

impl<V> Mapper<V> for HashMapper<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
