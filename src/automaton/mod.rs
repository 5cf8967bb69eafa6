//! Minimal acyclic finite-state automata over sorted key sets.
//!
//! Construction goes through [`builder::MinTreeBuilder`], which minimizes
//! on the fly with a [`registry::Registry`] and freezes into a
//! [`min_tree::MinTree`]. The traits below abstract traversal so that code
//! walking an automaton does not depend on its memory layout.

pub mod builder;
pub mod char_unit;
pub mod iterator;
pub mod min_tree;
pub mod registry;

use char_unit::CharUnit;

/// Core automaton abstraction: a set of keys with a rank for each.
pub trait Automaton {
    /// The node type used for traversal
    type Node: AutomatonNode;

    /// Get the root node of the automaton
    fn root(&self) -> Self::Node;

    /// Get the total number of accepted keys
    fn len(&self) -> usize;

    /// Check if the automaton accepts nothing
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a key is accepted
    fn contains(&self, key: &str) -> bool {
        let mut node = self.root();
        for unit in <<Self::Node as AutomatonNode>::Unit as CharUnit>::units(key) {
            match node.transition(unit) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.is_final()
    }

    /// Zero-based position of `key` among all accepted keys in sorted order,
    /// or `None` if the key is not accepted.
    fn lookup(&self, key: &str) -> Option<usize> {
        let mut node = self.root();
        let mut rank = 0;
        for unit in <<Self::Node as AutomatonNode>::Unit as CharUnit>::units(key) {
            if node.is_final() {
                rank += 1;
            }
            let mut next = None;
            for (label, child) in node.edges() {
                if label < unit {
                    rank += child.count();
                } else {
                    if label == unit {
                        next = Some(child);
                    }
                    break;
                }
            }
            node = next?;
        }
        node.is_final().then_some(rank)
    }
}

/// Traversable automaton state.
///
/// States form a DAG whose edges are labeled with units; final states mark
/// stored keys. Edges are reported in ascending label order.
pub trait AutomatonNode: Clone + Send + Sync {
    /// The label type of this automaton's transitions
    type Unit: CharUnit;

    /// Check if this state marks the end of a stored key
    fn is_final(&self) -> bool;

    /// Number of accepted keys reachable from this state, itself included
    fn count(&self) -> usize;

    /// Transition to a child state via the given label
    ///
    /// Returns `None` if no such transition exists
    fn transition(&self, label: Self::Unit) -> Option<Self>;

    /// Iterate over all outgoing edges as (label, child) pairs
    fn edges(&self) -> Box<dyn Iterator<Item = (Self::Unit, Self)> + '_>;

    /// Get the number of outgoing edges
    fn edge_count(&self) -> usize;
}
