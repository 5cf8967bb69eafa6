//! State registry for on-the-fly minimization.
//!
//! The registry is the suffix cache of the incremental construction: every
//! state whose right language can no longer change is handed to
//! [`Registry::register`], which either records it or answers with an
//! earlier, structurally identical state. Because states are registered
//! bottom-up, child references inside a registered state are always
//! registered ids themselves, so structural equality on
//! `(transitions, accepting)` is equality of right languages.

use super::char_unit::CharUnit;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index of a registered state.
///
/// Ids are assigned in registration order, so every transition target has a
/// smaller id than the state holding the transition.
pub type StateId = u32;

/// A state whose transitions are final.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrozenState<U: CharUnit> {
    /// Outgoing transitions in ascending label order
    pub edges: SmallVec<[(U, StateId); 4]>,
    /// True if the path to this state spells a stored key
    pub accepting: bool,
}

/// Structural-equality index over registered states.
///
/// Each distinct state is stored once, as a map key; the id order is
/// recovered when the registry is drained.
#[derive(Debug)]
pub struct Registry<U: CharUnit> {
    index: FxHashMap<FrozenState<U>, StateId>,
    // Accepted keys reachable from each state, by id
    counts: Vec<u32>,
    edge_total: usize,
}

impl<U: CharUnit> Registry<U> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Registry {
            index: FxHashMap::default(),
            counts: Vec::new(),
            edge_total: 0,
        }
    }

    /// Register a state, returning the id of its canonical representative.
    ///
    /// If an equivalent state was registered before, the candidate is
    /// dropped and the existing id is returned.
    pub fn register(&mut self, state: FrozenState<U>) -> StateId {
        if let Some(&existing) = self.index.get(&state) {
            return existing;
        }

        // Counts are bounded by the number of inserted keys, which the
        // builder keeps within u32.
        let count = u32::from(state.accepting)
            + state
                .edges
                .iter()
                .map(|&(_, target)| self.counts[target as usize])
                .sum::<u32>();

        let id = self.counts.len() as StateId;
        self.counts.push(count);
        self.edge_total += state.edges.len();
        self.index.insert(state, id);
        id
    }

    /// Number of accepted keys reachable from a registered state.
    pub fn count(&self, id: StateId) -> u32 {
        self.counts[id as usize]
    }

    /// Number of distinct states registered so far.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of transitions across registered states.
    pub fn edge_total(&self) -> usize {
        self.edge_total
    }

    /// Drain the registry into `(state, count)` pairs ordered by id.
    pub fn into_states(self) -> Vec<(FrozenState<U>, u32)> {
        let mut slots: Vec<Option<FrozenState<U>>> = vec![None; self.counts.len()];
        for (state, id) in self.index {
            slots[id as usize] = Some(state);
        }

        slots
            .into_iter()
            .zip(self.counts)
            .filter_map(|(state, count)| state.map(|s| (s, count)))
            .collect()
    }
}

impl<U: CharUnit> Default for Registry<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn leaf() -> FrozenState<char> {
        FrozenState {
            edges: SmallVec::new(),
            accepting: true,
        }
    }

    #[test]
    fn test_register_new_state() {
        let mut registry = Registry::new();
        let id = registry.register(leaf());
        assert_eq!(id, 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.count(id), 1);
    }

    #[test]
    fn test_register_returns_existing_equivalent() {
        let mut registry = Registry::new();
        let first = registry.register(leaf());
        let second = registry.register(leaf());
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_accepting_flag_distinguishes_states() {
        let mut registry = Registry::new();
        let leaf_id = registry.register(leaf());

        let a = registry.register(FrozenState {
            edges: smallvec![('x', leaf_id)],
            accepting: false,
        });
        let b = registry.register(FrozenState {
            edges: smallvec![('x', leaf_id)],
            accepting: true,
        });

        assert_ne!(a, b);
        assert_eq!(registry.count(a), 1);
        assert_eq!(registry.count(b), 2);
    }

    #[test]
    fn test_label_distinguishes_states() {
        let mut registry = Registry::new();
        let leaf_id = registry.register(leaf());

        let a = registry.register(FrozenState {
            edges: smallvec![('x', leaf_id)],
            accepting: false,
        });
        let b = registry.register(FrozenState {
            edges: smallvec![('y', leaf_id)],
            accepting: false,
        });

        assert_ne!(a, b);
        assert_eq!(registry.edge_total(), 2);
    }

    #[test]
    fn test_into_states_preserves_id_order() {
        let mut registry = Registry::new();
        let leaf_id = registry.register(leaf());
        let parent = registry.register(FrozenState {
            edges: smallvec![('a', leaf_id), ('b', leaf_id)],
            accepting: false,
        });

        let states = registry.into_states();
        assert_eq!(states.len(), 2);
        assert!(states[leaf_id as usize].0.accepting);
        assert_eq!(states[parent as usize].0.edges.len(), 2);
        assert_eq!(states[parent as usize].1, 2);
    }
}
