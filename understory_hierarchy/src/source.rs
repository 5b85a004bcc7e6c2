// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy sources: where parent/child relations come from.
//!
//! The mapper never stores a tree of its own. It pulls sibling groups from a
//! [`HierarchySource`] on demand and caches only their filtered, sorted
//! membership plus row counts. [`TreeData`] is a small in-memory source for
//! hosts that already hold the whole hierarchy.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::filter::VisibilityFilter;

/// Supplies parent/child relations to a [`HierarchyMapper`](crate::HierarchyMapper).
///
/// Implementations may be backed by memory, a database, or a remote service.
/// The mapper calls [`children`](Self::children) only for the root group and
/// for expanded, visible nodes, and calls [`parent`](Self::parent) when it has
/// to locate a node by identity.
pub trait HierarchySource {
    /// Node identity. Only equality and hashing are relied upon.
    type Node: Clone + Eq + Hash;

    /// Error produced when the source cannot answer.
    type Error;

    /// Returns the ordered children of `parent`, or the roots when `parent`
    /// is `None`.
    fn children(&self, parent: Option<&Self::Node>) -> Result<Vec<Self::Node>, Self::Error>;

    /// Returns the parent of `node`, or `None` for a root.
    fn parent(&self, node: &Self::Node) -> Result<Option<Self::Node>, Self::Error>;

    /// Reports whether any descendant of `node` (excluding `node` itself)
    /// matches `filter`.
    ///
    /// Returning `None` makes the mapper walk the subtree through
    /// [`children`](Self::children), one call and one `Vec` per node. Sources
    /// that can do better, from an index or by walking their own storage in
    /// place, return `Some`.
    fn has_matching_descendant(
        &self,
        node: &Self::Node,
        filter: &dyn VisibilityFilter<Self::Node>,
    ) -> Option<Result<bool, Self::Error>> {
        let _ = (node, filter);
        None
    }
}

impl<S> HierarchySource for &S
where
    S: HierarchySource + ?Sized,
{
    type Node = S::Node;
    type Error = S::Error;

    fn children(&self, parent: Option<&Self::Node>) -> Result<Vec<Self::Node>, Self::Error> {
        (**self).children(parent)
    }

    fn parent(&self, node: &Self::Node) -> Result<Option<Self::Node>, Self::Error> {
        (**self).parent(node)
    }

    fn has_matching_descendant(
        &self,
        node: &Self::Node,
        filter: &dyn VisibilityFilter<Self::Node>,
    ) -> Option<Result<bool, Self::Error>> {
        (**self).has_matching_descendant(node, filter)
    }
}

/// Error returned when building a [`TreeData`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeDataError {
    /// The node is already part of the hierarchy.
    DuplicateNode,
    /// The requested parent is not part of the hierarchy.
    UnknownParent,
    /// The move would place a node below itself.
    WouldCycle,
}

impl fmt::Display for TreeDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode => f.write_str("node is already in the hierarchy"),
            Self::UnknownParent => f.write_str("parent is not in the hierarchy"),
            Self::WouldCycle => f.write_str("node cannot be moved below itself"),
        }
    }
}

impl core::error::Error for TreeDataError {}

#[derive(Clone, Debug)]
struct Links<N> {
    parent: Option<N>,
    children: Vec<N>,
}

/// An in-memory hierarchy with ordered roots and children.
///
/// # Example
///
/// ```
/// use understory_hierarchy::TreeData;
///
/// let mut data = TreeData::new();
/// data.add_item(None, "docs").unwrap();
/// data.add_item(Some(&"docs"), "guide.md").unwrap();
///
/// assert_eq!(data.roots(), &["docs"]);
/// assert_eq!(data.children_of(Some(&"docs")), &["guide.md"]);
/// assert_eq!(data.parent_of(&"guide.md"), Some(&"docs"));
/// ```
#[derive(Clone, Debug)]
pub struct TreeData<N>
where
    N: Clone + Eq + Hash,
{
    roots: Vec<N>,
    links: HashMap<N, Links<N>>,
}

impl<N> Default for TreeData<N>
where
    N: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> TreeData<N>
where
    N: Clone + Eq + Hash,
{
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Returns the number of nodes at every level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if the hierarchy holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns `true` if `node` is part of the hierarchy.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.links.contains_key(node)
    }

    /// Returns the roots in insertion order.
    #[must_use]
    pub fn roots(&self) -> &[N] {
        &self.roots
    }

    /// Returns the children of `parent` (or the roots) in insertion order.
    ///
    /// Unknown parents have no children.
    #[must_use]
    pub fn children_of(&self, parent: Option<&N>) -> &[N] {
        match parent {
            None => &self.roots,
            Some(parent) => self
                .links
                .get(parent)
                .map(|links| links.children.as_slice())
                .unwrap_or_default(),
        }
    }

    /// Returns the parent of `node`, or `None` for roots and unknown nodes.
    #[must_use]
    pub fn parent_of(&self, node: &N) -> Option<&N> {
        self.links.get(node).and_then(|links| links.parent.as_ref())
    }

    /// Appends `node` as the last child of `parent`, or as the last root.
    pub fn add_item(&mut self, parent: Option<&N>, node: N) -> Result<(), TreeDataError> {
        if self.links.contains_key(&node) {
            return Err(TreeDataError::DuplicateNode);
        }
        match parent {
            None => self.roots.push(node.clone()),
            Some(parent) => self
                .links
                .get_mut(parent)
                .ok_or(TreeDataError::UnknownParent)?
                .children
                .push(node.clone()),
        }
        self.links.insert(
            node,
            Links {
                parent: parent.cloned(),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Appends every node of `nodes` under `parent`.
    ///
    /// Stops at the first failure; nodes added before it stay in place.
    pub fn add_items(
        &mut self,
        parent: Option<&N>,
        nodes: impl IntoIterator<Item = N>,
    ) -> Result<(), TreeDataError> {
        for node in nodes {
            self.add_item(parent, node)?;
        }
        Ok(())
    }

    /// Adds `roots` as root nodes and recursively adds the children produced
    /// by `children_of` for every added node.
    pub fn add_items_with<I, F>(
        &mut self,
        roots: impl IntoIterator<Item = N>,
        mut children_of: F,
    ) -> Result<(), TreeDataError>
    where
        I: IntoIterator<Item = N>,
        F: FnMut(&N) -> I,
    {
        let mut pending: Vec<(Option<N>, N)> = roots.into_iter().map(|n| (None, n)).collect();
        // Depth-first so siblings keep their relative order.
        pending.reverse();
        while let Some((parent, node)) = pending.pop() {
            self.add_item(parent.as_ref(), node.clone())?;
            let mut kids: Vec<_> = children_of(&node)
                .into_iter()
                .map(|child| (Some(node.clone()), child))
                .collect();
            kids.reverse();
            pending.extend(kids);
        }
        Ok(())
    }

    /// Removes `node` and its whole subtree.
    ///
    /// Returns `false` if the node was not part of the hierarchy.
    pub fn remove(&mut self, node: &N) -> bool {
        let Some(links) = self.links.remove(node) else {
            return false;
        };
        let siblings = match &links.parent {
            None => Some(&mut self.roots),
            Some(parent) => self.links.get_mut(parent).map(|p| &mut p.children),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|n| n != node);
        }
        let mut stack = links.children;
        while let Some(next) = stack.pop() {
            if let Some(links) = self.links.remove(&next) {
                stack.extend(links.children);
            }
        }
        true
    }

    /// Moves `node` (with its subtree) to the end of `new_parent`'s children.
    pub fn move_item(&mut self, node: &N, new_parent: Option<&N>) -> Result<(), TreeDataError> {
        if let Some(target) = new_parent {
            if !self.links.contains_key(target) {
                return Err(TreeDataError::UnknownParent);
            }
            // A node cannot move below itself.
            let mut cursor = Some(target);
            while let Some(current) = cursor {
                if current == node {
                    return Err(TreeDataError::WouldCycle);
                }
                cursor = self.parent_of(current);
            }
        }
        let old_parent = match self.links.entry(node.clone()) {
            Entry::Occupied(mut entry) => {
                core::mem::replace(&mut entry.get_mut().parent, new_parent.cloned())
            }
            Entry::Vacant(_) => return Err(TreeDataError::UnknownParent),
        };
        match &old_parent {
            None => self.roots.retain(|n| n != node),
            Some(parent) => {
                if let Some(links) = self.links.get_mut(parent) {
                    links.children.retain(|n| n != node);
                }
            }
        }
        match new_parent {
            None => self.roots.push(node.clone()),
            Some(parent) => {
                if let Some(links) = self.links.get_mut(parent) {
                    links.children.push(node.clone());
                }
            }
        }
        Ok(())
    }
}

impl<N> HierarchySource for TreeData<N>
where
    N: Clone + Eq + Hash,
{
    type Node = N;
    type Error = Infallible;

    fn children(&self, parent: Option<&N>) -> Result<Vec<N>, Infallible> {
        Ok(self.children_of(parent).to_vec())
    }

    fn parent(&self, node: &N) -> Result<Option<N>, Infallible> {
        Ok(self.parent_of(node).cloned())
    }

    /// Walks the in-memory links depth-first without cloning child lists, and
    /// stops at the first match.
    fn has_matching_descendant(
        &self,
        node: &N,
        filter: &dyn VisibilityFilter<N>,
    ) -> Option<Result<bool, Infallible>> {
        let mut stack: Vec<&N> = self.children_of(Some(node)).iter().collect();
        while let Some(next) = stack.pop() {
            if filter.matches(next) {
                return Some(Ok(true));
            }
            stack.extend(self.children_of(Some(next)));
        }
        Some(Ok(false))
    }
}
