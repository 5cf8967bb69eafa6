//! Incremental construction of a minimal automaton from sorted keys.
//!
//! The builder keeps the states of the previously inserted key open on an
//! active path. When the next key arrives, everything on that path below
//! the common prefix can no longer change (no later key can extend it, by
//! sort order), so those states are frozen deepest-first and handed to the
//! [`Registry`]. The new key's suffix is then appended as fresh open states.

use super::char_unit::CharUnit;
use super::min_tree::{Edge, MinTree, StateEntry};
use super::registry::{FrozenState, Registry, StateId};
use crate::error::{BuildError, Result};
use log::debug;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// A state on the active path; its last edge may still change.
struct OpenState<U: CharUnit> {
    edges: SmallVec<[(U, StateId); 4]>,
    accepting: bool,
}

impl<U: CharUnit> OpenState<U> {
    fn new() -> Self {
        OpenState {
            edges: SmallVec::new(),
            accepting: false,
        }
    }

    fn freeze(self) -> FrozenState<U> {
        FrozenState {
            edges: self.edges,
            accepting: self.accepting,
        }
    }
}

/// Builder for constructing a [`MinTree`] from keys in sorted order.
///
/// Keys must be inserted in non-decreasing lexicographic order; a key that
/// sorts before its predecessor fails with [`BuildError::OutOfOrder`].
/// Inserting a key equal to its predecessor is a no-op reported as
/// `Ok(false)`.
///
/// Each builder owns its own registry, so independent automata can be
/// built concurrently on different threads.
///
/// # Example
///
/// ```
/// use mafsa_mapper::automaton::builder::MinTreeBuilder;
///
/// let mut builder: MinTreeBuilder = MinTreeBuilder::new();
/// builder.insert("resting").unwrap();
/// builder.insert("testing").unwrap();
/// let tree = builder.finish().unwrap();
///
/// // Both keys share every state below the first letter
/// assert_eq!(tree.state_count(), 8);
/// ```
pub struct MinTreeBuilder<U: CharUnit = char> {
    registry: Registry<U>,
    // Open states for each prefix of `prev_key`; index 0 is the root
    active_path: Vec<OpenState<U>>,
    prev_key: Vec<U>,
    key_count: u32,
    // Open states ever created, the root included
    created: u32,
}

impl MinTreeBuilder {
    /// Create a new character-level builder.
    ///
    /// Use `MinTreeBuilder::<u8>::default()` for a byte-level automaton.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U: CharUnit> MinTreeBuilder<U> {
    /// Add a key to the automaton.
    ///
    /// Returns `Ok(true)` if the key is new and `Ok(false)` if it repeats
    /// the previous key.
    ///
    /// # Errors
    ///
    /// - [`BuildError::OutOfOrder`] if `key` sorts before the previous key.
    /// - [`BuildError::CapacityExceeded`] if the key or state count would
    ///   overflow 32-bit indices.
    pub fn insert(&mut self, key: &str) -> Result<bool> {
        let units = U::from_str(key);

        if self.key_count > 0 {
            match units.as_slice().cmp(self.prev_key.as_slice()) {
                Ordering::Less => {
                    return Err(BuildError::OutOfOrder {
                        previous: U::to_string(&self.prev_key),
                        key: key.to_string(),
                    });
                }
                Ordering::Equal => return Ok(false),
                Ordering::Greater => {}
            }
        }

        let common_prefix_len = self
            .prev_key
            .iter()
            .zip(units.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let suffix_len = units.len() - common_prefix_len;
        let key_count = self
            .key_count
            .checked_add(1)
            .ok_or(BuildError::CapacityExceeded { what: "keys" })?;
        let created = u32::try_from(suffix_len)
            .ok()
            .and_then(|n| self.created.checked_add(n))
            .ok_or(BuildError::CapacityExceeded { what: "states" })?;

        // Minimize the suffix of the previous key from the divergence point
        self.minimize(common_prefix_len);

        self.active_path
            .extend((0..suffix_len).map(|_| OpenState::new()));
        if let Some(last) = self.active_path.last_mut() {
            last.accepting = true;
        }

        self.prev_key = units;
        self.key_count = key_count;
        self.created = created;
        Ok(true)
    }

    /// Number of distinct keys inserted so far.
    pub fn len(&self) -> usize {
        self.key_count as usize
    }

    /// True if no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Freeze the remaining active path and return the finished automaton.
    pub fn finish(mut self) -> Result<MinTree<U>> {
        self.minimize(0);

        let root = self.active_path.pop().unwrap_or_else(OpenState::new);
        let root_id = self.registry.register(root.freeze());

        let tree = self.compact(root_id)?;
        debug!(
            "finished automaton: {} keys, {} states, {} edges",
            tree.len(),
            tree.state_count(),
            tree.edge_count()
        );
        Ok(tree)
    }

    /// Freeze and register every open state deeper than `down_to_len`.
    fn minimize(&mut self, down_to_len: usize) {
        while self.active_path.len() > down_to_len + 1 {
            let Some(child) = self.active_path.pop() else {
                break;
            };
            // The popped state sits at depth `active_path.len()`, reached
            // from its parent by the label at the previous position.
            let label = self.prev_key[self.active_path.len() - 1];
            let child_id = self.registry.register(child.freeze());
            if let Some(parent) = self.active_path.last_mut() {
                parent.edges.push((label, child_id));
            }
        }
    }

    /// Lay the registered states out as a state array plus edge arena.
    fn compact(self, root: StateId) -> Result<MinTree<U>> {
        let edge_total = self.registry.edge_total();
        if u32::try_from(edge_total).is_err() {
            return Err(BuildError::CapacityExceeded { what: "edges" });
        }

        let states = self.registry.into_states();
        let counts: Vec<u32> = states.iter().map(|(_, count)| *count).collect();

        let mut entries = Vec::with_capacity(states.len());
        let mut edges = Vec::with_capacity(edge_total);
        for (state, _) in states {
            debug_assert!(state.edges.windows(2).all(|w| w[0].0 < w[1].0));
            entries.push(StateEntry {
                edge_offset: edges.len() as u32,
                edge_len: state.edges.len() as u32,
                accepting: state.accepting,
            });
            edges.extend(state.edges.iter().map(|&(label, target)| Edge {
                label,
                target,
                count: counts[target as usize],
            }));
        }

        Ok(MinTree::from_parts(entries, edges, root, self.key_count))
    }
}

impl<U: CharUnit> Default for MinTreeBuilder<U> {
    /// A builder holding only an open root.
    fn default() -> Self {
        MinTreeBuilder {
            registry: Registry::new(),
            active_path: vec![OpenState::new()],
            prev_key: Vec::new(),
            key_count: 0,
            created: 1,
        }
    }
}
