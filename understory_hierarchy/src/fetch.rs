// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Windowed pre-order traversal over cached sibling groups.

use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Range;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::group::SiblingGroup;

/// Lazy iterator over the nodes of a flat row range.
///
/// Returned by [`HierarchyMapper::fetch`](crate::HierarchyMapper::fetch). It
/// keeps one cursor per open level, so advancing to the next row is amortized
/// O(1) rather than a fresh descent from the root. Cloning yields an
/// independent cursor at the same position.
#[derive(Clone, Debug)]
pub struct Fetch<'a, N>
where
    N: Clone + Eq + Hash,
{
    groups: &'a HashMap<N, SiblingGroup<N>>,
    /// Open groups from the roots down, each with the position of the next
    /// member to yield at that level.
    stack: SmallVec<[(&'a SiblingGroup<N>, usize); 8]>,
    remaining: usize,
}

impl<'a, N> Fetch<'a, N>
where
    N: Clone + Eq + Hash,
{
    pub(crate) fn empty(groups: &'a HashMap<N, SiblingGroup<N>>) -> Self {
        Self {
            groups,
            stack: SmallVec::new(),
            remaining: 0,
        }
    }

    /// Positions a cursor on `range.start`.
    ///
    /// Returns `None` if the cached groups do not cover the range.
    pub(crate) fn new(
        root: &'a SiblingGroup<N>,
        groups: &'a HashMap<N, SiblingGroup<N>>,
        range: Range<usize>,
    ) -> Option<Self> {
        let mut fetch = Self::empty(groups);
        if range.is_empty() {
            return Some(fetch);
        }
        if range.end > root.total() {
            return None;
        }
        let mut group = root;
        let mut offset = range.start;
        loop {
            let (position, inner) = group.find_offset(offset)?;
            fetch.stack.push((group, position));
            if inner == 0 {
                break;
            }
            group = groups.get(&group.entry(position).node)?;
            offset = inner - 1;
        }
        fetch.remaining = range.len();
        Some(fetch)
    }

    /// Moves the top cursor to the next sibling, closing exhausted levels.
    fn advance_sibling(&mut self) {
        while let Some((group, position)) = self.stack.last_mut() {
            *position += 1;
            if *position < group.len() {
                return;
            }
            self.stack.pop();
        }
    }
}

impl<'a, N> Iterator for Fetch<'a, N>
where
    N: Clone + Eq + Hash,
{
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let &(group, position) = self.stack.last()?;
        let entry = group.entry(position);
        self.remaining -= 1;

        // Rows below this member come next if it shows any.
        let children = if entry.span > 1 {
            self.groups.get(&entry.node)
        } else {
            None
        };
        match children {
            Some(children) => self.stack.push((children, 0)),
            None => self.advance_sibling(),
        }
        Some(&entry.node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<N> ExactSizeIterator for Fetch<'_, N> where N: Clone + Eq + Hash {}

impl<N> FusedIterator for Fetch<'_, N> where N: Clone + Eq + Hash {}
