//! Sorted enumeration of accepted keys.
//!
//! The iterator performs a depth-first walk over the frozen automaton,
//! visiting edges in ascending label order, so keys come out in the same
//! order they were inserted and the n-th key yielded has rank n.

use super::char_unit::CharUnit;
use super::min_tree::MinTree;
use super::registry::StateId;

/// Iterator over the keys of a [`MinTree`] in sorted order.
///
/// # Examples
///
/// ```
/// use mafsa_mapper::automaton::builder::MinTreeBuilder;
///
/// let mut builder: MinTreeBuilder = MinTreeBuilder::new();
/// for key in ["cat", "cats", "dog"] {
///     builder.insert(key).unwrap();
/// }
/// let tree = builder.finish().unwrap();
///
/// let keys: Vec<String> = tree.keys().collect();
/// assert_eq!(keys, vec!["cat", "cats", "dog"]);
/// ```
pub struct Keys<'a, U: CharUnit> {
    tree: &'a MinTree<U>,
    /// DFS frames: a state and the index of its next unvisited edge.
    stack: Vec<(StateId, usize)>,
    /// Labels along the current path; one shorter than `stack`.
    path: Vec<U>,
    /// The root's own key (the empty string) has not been yielded yet.
    root_pending: bool,
}

impl<'a, U: CharUnit> Keys<'a, U> {
    pub(crate) fn new(tree: &'a MinTree<U>) -> Self {
        let root = tree.root_id();
        // Capacity 16 covers typical key lengths
        let mut stack = Vec::with_capacity(16);
        stack.push((root, 0));
        Keys {
            tree,
            stack,
            path: Vec::with_capacity(16),
            root_pending: tree.is_accepting(root),
        }
    }
}

impl<U: CharUnit> Iterator for Keys<'_, U> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.root_pending {
            self.root_pending = false;
            return Some(String::new());
        }

        while let Some((state, cursor)) = self.stack.last_mut() {
            let edges = self.tree.edges_of(*state);
            if *cursor < edges.len() {
                let edge = edges[*cursor];
                *cursor += 1;
                self.path.push(edge.label);
                self.stack.push((edge.target, 0));
                if self.tree.is_accepting(edge.target) {
                    return Some(U::to_string(&self.path));
                }
            } else {
                self.stack.pop();
                self.path.pop();
            }
        }

        None
    }
}
