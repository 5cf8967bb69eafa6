//! Frozen minimal automaton with rank-aware traversal.
//!
//! A [`MinTree`] is produced either by [`MinTreeBuilder::finish`] or by the
//! decoder, and cannot be mutated afterwards. All states live in one array
//! and all transitions in a second, contiguous edge arena; each state holds
//! a window into that arena. Every edge carries the number of accepted keys
//! reachable through it, which is what turns a plain membership walk into a
//! rank computation.
//!
//! [`MinTreeBuilder::finish`]: super::builder::MinTreeBuilder::finish

use super::char_unit::CharUnit;
use super::iterator::Keys;
use super::registry::StateId;
use super::{Automaton, AutomatonNode};
use std::sync::Arc;

/// Per-state record: a window into the edge arena plus the accepting flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StateEntry {
    pub(crate) edge_offset: u32,
    pub(crate) edge_len: u32,
    pub(crate) accepting: bool,
}

/// A transition of the frozen automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge<U> {
    /// Label consumed by this transition
    pub label: U,
    /// Target state
    pub target: StateId,
    /// Accepted keys reachable from the target, the target itself included
    pub count: u32,
}

/// An immutable minimal acyclic automaton over a sorted key set.
///
/// Every accepted key has a rank: its zero-based position in sorted order.
/// [`MinTree::lookup`] maps a key to its rank and [`MinTree::key_at`] maps
/// a rank back to its key.
///
/// Cloning is cheap (two `Arc` clones), and the structure is `Send + Sync`,
/// so one automaton can serve any number of concurrent readers.
///
/// # Example
///
/// ```
/// use mafsa_mapper::automaton::builder::MinTreeBuilder;
///
/// let mut builder: MinTreeBuilder = MinTreeBuilder::new();
/// for key in ["app", "apple", "apply"] {
///     builder.insert(key).unwrap();
/// }
/// let tree = builder.finish().unwrap();
///
/// assert_eq!(tree.lookup("apple"), Some(1));
/// assert_eq!(tree.lookup("appl"), None);
/// assert_eq!(tree.key_at(2).as_deref(), Some("apply"));
/// ```
#[derive(Clone, Debug)]
pub struct MinTree<U: CharUnit = char> {
    states: Arc<Vec<StateEntry>>,
    edges: Arc<Vec<Edge<U>>>,
    root: StateId,
    key_count: u32,
}

impl<U: CharUnit> MinTree<U> {
    /// An automaton accepting nothing: a single non-accepting root.
    pub fn empty() -> Self {
        let root = StateEntry {
            edge_offset: 0,
            edge_len: 0,
            accepting: false,
        };
        Self::from_parts(vec![root], Vec::new(), 0, 0)
    }

    pub(crate) fn from_parts(
        states: Vec<StateEntry>,
        edges: Vec<Edge<U>>,
        root: StateId,
        key_count: u32,
    ) -> Self {
        MinTree {
            states: Arc::new(states),
            edges: Arc::new(edges),
            root,
            key_count,
        }
    }

    /// Number of accepted keys.
    pub fn len(&self) -> usize {
        self.key_count as usize
    }

    /// True if no key is accepted.
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Number of states, the root included.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions in the edge arena.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn root_id(&self) -> StateId {
        self.root
    }

    #[inline]
    pub(crate) fn is_accepting(&self, id: StateId) -> bool {
        self.states[id as usize].accepting
    }

    #[inline]
    pub(crate) fn edges_of(&self, id: StateId) -> &[Edge<U>] {
        let entry = &self.states[id as usize];
        let start = entry.edge_offset as usize;
        &self.edges[start..start + entry.edge_len as usize]
    }

    /// Rank of `key`, or `None` if the key is not accepted.
    ///
    /// Walking down from the root, every sibling transition whose label
    /// sorts before the one followed contributes its key count, and every
    /// accepting state passed through contributes one (its key is a proper
    /// prefix and sorts first). The walk neither allocates nor writes.
    pub fn lookup(&self, key: &str) -> Option<usize> {
        let mut state = self.root;
        let mut rank: u32 = 0;

        for unit in U::units(key) {
            if self.is_accepting(state) {
                rank += 1;
            }

            let mut next = None;
            for edge in self.edges_of(state) {
                if edge.label < unit {
                    rank += edge.count;
                } else {
                    if edge.label == unit {
                        next = Some(edge.target);
                    }
                    break;
                }
            }

            state = next?;
        }

        if self.is_accepting(state) {
            Some(rank as usize)
        } else {
            None
        }
    }

    /// True if `key` is accepted.
    pub fn contains(&self, key: &str) -> bool {
        let mut state = self.root;
        for unit in U::units(key) {
            let edges = self.edges_of(state);
            match edges.binary_search_by(|edge| edge.label.cmp(&unit)) {
                Ok(pos) => state = edges[pos].target,
                Err(_) => return false,
            }
        }
        self.is_accepting(state)
    }

    /// The key with the given rank, or `None` if `rank >= len()`.
    pub fn key_at(&self, rank: usize) -> Option<String> {
        if rank >= self.len() {
            return None;
        }

        let mut remaining = rank as u32;
        let mut state = self.root;
        let mut path = Vec::new();

        loop {
            if self.is_accepting(state) {
                if remaining == 0 {
                    return Some(U::to_string(&path));
                }
                remaining -= 1;
            }

            let mut next = None;
            for edge in self.edges_of(state) {
                if remaining < edge.count {
                    next = Some(edge);
                    break;
                }
                remaining -= edge.count;
            }
            let edge = next?;

            path.push(edge.label);
            state = edge.target;
        }
    }

    /// Iterate accepted keys in sorted order; the n-th key has rank n.
    pub fn keys(&self) -> Keys<'_, U> {
        Keys::new(self)
    }
}

impl<U: CharUnit> Default for MinTree<U> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<U: CharUnit> Automaton for MinTree<U> {
    type Node = MinTreeNode<U>;

    fn root(&self) -> Self::Node {
        MinTreeNode {
            tree: self.clone(),
            id: self.root,
            count: self.key_count,
        }
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn contains(&self, key: &str) -> bool {
        MinTree::contains(self, key)
    }

    fn lookup(&self, key: &str) -> Option<usize> {
        MinTree::lookup(self, key)
    }
}

/// A handle on one state of a [`MinTree`].
///
/// Handles are cheap to clone (`Arc` reference counting).
#[derive(Clone, Debug)]
pub struct MinTreeNode<U: CharUnit = char> {
    tree: MinTree<U>,
    id: StateId,
    count: u32,
}

impl<U: CharUnit> MinTreeNode<U> {
    /// Index of this state within the automaton.
    pub fn id(&self) -> StateId {
        self.id
    }
}

impl<U: CharUnit> AutomatonNode for MinTreeNode<U> {
    type Unit = U;

    fn is_final(&self) -> bool {
        self.tree.is_accepting(self.id)
    }

    fn count(&self) -> usize {
        self.count as usize
    }

    fn transition(&self, label: U) -> Option<Self> {
        let edges = self.tree.edges_of(self.id);
        edges
            .binary_search_by(|edge| edge.label.cmp(&label))
            .ok()
            .map(|pos| MinTreeNode {
                tree: self.tree.clone(),
                id: edges[pos].target,
                count: edges[pos].count,
            })
    }

    fn edges(&self) -> Box<dyn Iterator<Item = (U, Self)> + '_> {
        Box::new(self.tree.edges_of(self.id).iter().map(|edge| {
            (
                edge.label,
                MinTreeNode {
                    tree: self.tree.clone(),
                    id: edge.target,
                    count: edge.count,
                },
            )
        }))
    }

    fn edge_count(&self) -> usize {
        self.tree.edges_of(self.id).len()
    }
}
