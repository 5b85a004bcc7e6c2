// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter and sort composition for sibling groups.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use crate::group::{Entry, sort_entries};
use crate::source::HierarchySource;

/// Decides whether a node may appear as a row.
///
/// Implemented for every `Fn(&N) -> bool`, so closures can be passed directly.
pub trait VisibilityFilter<N> {
    /// Returns `true` if `node` passes the filter.
    fn matches(&self, node: &N) -> bool;
}

impl<N, F> VisibilityFilter<N> for F
where
    F: Fn(&N) -> bool,
{
    fn matches(&self, node: &N) -> bool {
        self(node)
    }
}

/// Orders the members of one sibling group.
///
/// Only siblings are ever compared; nodes at different depths never meet.
/// Implemented for every `Fn(&N, &N) -> Ordering`.
pub trait SiblingOrder<N> {
    /// Compares two siblings.
    fn compare(&self, a: &N, b: &N) -> Ordering;
}

impl<N, F> SiblingOrder<N> for F
where
    F: Fn(&N, &N) -> Ordering,
{
    fn compare(&self, a: &N, b: &N) -> Ordering {
        self(a, b)
    }
}

/// How the active [`VisibilityFilter`] treats ancestors of matching nodes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// A node is shown only if it matches the filter itself.
    #[default]
    Strict,
    /// A node is shown if it matches, or if any of its descendants in the
    /// source matches, so that matching nodes keep their ancestor path.
    KeepAncestors,
}

/// The predicate, filter mode, and comparator applied to every sibling group.
pub(crate) struct Composition<N> {
    filter: Option<Box<dyn VisibilityFilter<N>>>,
    mode: FilterMode,
    order: Option<Box<dyn SiblingOrder<N>>>,
}

impl<N> Default for Composition<N> {
    fn default() -> Self {
        Self {
            filter: None,
            mode: FilterMode::Strict,
            order: None,
        }
    }
}

impl<N> fmt::Debug for Composition<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("filtered", &self.filter.is_some())
            .field("mode", &self.mode)
            .field("sorted", &self.order.is_some())
            .finish()
    }
}

impl<N> Composition<N> {
    pub(crate) fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub(crate) fn mode(&self) -> FilterMode {
        self.mode
    }

    pub(crate) fn set_filter(&mut self, filter: Option<Box<dyn VisibilityFilter<N>>>) {
        self.filter = filter;
    }

    pub(crate) fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    pub(crate) fn order(&self) -> Option<&dyn SiblingOrder<N>> {
        self.order.as_deref()
    }

    pub(crate) fn set_order(&mut self, order: Option<Box<dyn SiblingOrder<N>>>) {
        self.order = order;
    }

    /// Pulls the children of `parent` from `source` and keeps the admitted ones.
    ///
    /// Entries carry their source ordinal and a span of one; the caller fills
    /// in expanded spans and sorts.
    pub(crate) fn collect<S>(
        &self,
        source: &S,
        parent: Option<&N>,
    ) -> Result<Vec<Entry<N>>, S::Error>
    where
        S: HierarchySource<Node = N> + ?Sized,
    {
        let children = source.children(parent)?;
        let mut entries = Vec::with_capacity(children.len());
        for (ordinal, node) in children.into_iter().enumerate() {
            if self.admits(source, &node)? {
                entries.push(Entry::new(node, ordinal));
            }
        }
        Ok(entries)
    }

    /// Sorts entries by the comparator, or back into source order without one.
    pub(crate) fn sort(&self, entries: &mut [Entry<N>]) {
        sort_entries(entries, self.order());
    }

    fn admits<S>(&self, source: &S, node: &N) -> Result<bool, S::Error>
    where
        S: HierarchySource<Node = N> + ?Sized,
    {
        let Some(filter) = self.filter.as_deref() else {
            return Ok(true);
        };
        if filter.matches(node) {
            return Ok(true);
        }
        match self.mode {
            FilterMode::Strict => Ok(false),
            FilterMode::KeepAncestors => descendant_matches(source, node, filter),
        }
    }
}

/// Asks the source first, then falls back to a depth-first walk that stops at
/// the first match.
fn descendant_matches<S>(
    source: &S,
    node: &S::Node,
    filter: &dyn VisibilityFilter<S::Node>,
) -> Result<bool, S::Error>
where
    S: HierarchySource + ?Sized,
{
    if let Some(answer) = source.has_matching_descendant(node, filter) {
        return answer;
    }
    let mut stack = source.children(Some(node))?;
    while let Some(next) = stack.pop() {
        if filter.matches(&next) {
            return Ok(true);
        }
        stack.extend(source.children(Some(&next))?);
    }
    Ok(false)
}
