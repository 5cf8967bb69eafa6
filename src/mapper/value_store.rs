//! Flat value storage indexed by key rank.

use serde::{Deserialize, Serialize};

/// Values in sorted key order.
///
/// Position `i` holds the value of the key with rank `i`. A store is only
/// meaningful next to the automaton it was built in lockstep with; the pair
/// is kept together by [`MafsaMapper`](super::MafsaMapper).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueStore<V> {
    values: Vec<V>,
}

impl<V> ValueStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        ValueStore { values: Vec::new() }
    }

    /// Value at `rank`, or `None` if out of range.
    #[inline]
    pub fn get(&self, rank: usize) -> Option<&V> {
        self.values.get(rank)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate values in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    /// Take back the underlying vector.
    pub fn into_inner(self) -> Vec<V> {
        self.values
    }

    pub(crate) fn push(&mut self, value: V) {
        self.values.push(value);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut V> {
        self.values.last_mut()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
    }
}

impl<V> From<Vec<V>> for ValueStore<V> {
    fn from(values: Vec<V>) -> Self {
        ValueStore { values }
    }
}

impl<V> FromIterator<V> for ValueStore<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        ValueStore {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a ValueStore<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
