// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expansion state: which nodes show their children.

use core::hash::Hash;

use hashbrown::HashSet;

/// The set of nodes currently marked expanded.
///
/// Membership means "this node shows its children whenever it is itself
/// visible". A node may be expanded while one of its ancestors is collapsed;
/// its expansion then takes effect once the ancestor is expanded again.
///
/// # Example
///
/// ```
/// use understory_hierarchy::ExpansionState;
///
/// let mut state = ExpansionState::<u32>::new();
/// assert!(state.insert(7));
/// assert!(!state.insert(7));
/// assert!(state.contains(&7));
/// assert!(state.remove(&7));
/// assert!(state.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct ExpansionState<N>
where
    N: Eq + Hash,
{
    expanded: HashSet<N>,
    revision: u64,
}

impl<N> Default for ExpansionState<N>
where
    N: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ExpansionState<N>
where
    N: Eq + Hash,
{
    /// Creates an empty expansion state where every node is collapsed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expanded: HashSet::new(),
            revision: 0,
        }
    }

    /// Returns a counter that increments every time membership changes.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` if `node` is marked expanded.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.expanded.contains(node)
    }

    /// Marks `node` expanded.
    ///
    /// Returns `true` if the node was not already expanded.
    pub fn insert(&mut self, node: N) -> bool {
        let inserted = self.expanded.insert(node);
        if inserted {
            self.revision = self.revision.wrapping_add(1);
        }
        inserted
    }

    /// Marks `node` collapsed.
    ///
    /// Returns `true` if the node was expanded before the call.
    pub fn remove(&mut self, node: &N) -> bool {
        let removed = self.expanded.remove(node);
        if removed {
            self.revision = self.revision.wrapping_add(1);
        }
        removed
    }

    /// Returns the number of expanded nodes, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    /// Returns `true` if no node is expanded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Iterates over expanded nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &N> + '_ {
        self.expanded.iter()
    }

    /// Collapses every node.
    pub fn clear(&mut self) {
        if !self.expanded.is_empty() {
            self.expanded.clear();
            self.revision = self.revision.wrapping_add(1);
        }
    }
}

impl<N> FromIterator<N> for ExpansionState<N>
where
    N: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
            revision: 0,
        }
    }
}
