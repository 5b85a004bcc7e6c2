// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached sibling groups: filtered, sorted members plus per-member row spans.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::filter::SiblingOrder;

/// One member of a sibling group.
#[derive(Clone, Debug)]
pub(crate) struct Entry<N> {
    pub(crate) node: N,
    /// Position in the unsorted source sequence.
    pub(crate) ordinal: usize,
    /// Rows occupied by this member: itself plus every visible descendant.
    pub(crate) span: usize,
}

impl<N> Entry<N> {
    pub(crate) fn new(node: N, ordinal: usize) -> Self {
        Self {
            node,
            ordinal,
            span: 1,
        }
    }
}

/// The visible children of one parent (or the roots), in display order.
///
/// `total` is the sum of all spans, i.e. the number of rows the group
/// contributes below its parent when the parent is expanded.
#[derive(Clone, Debug)]
pub(crate) struct SiblingGroup<N>
where
    N: Clone + Eq + Hash,
{
    entries: Vec<Entry<N>>,
    positions: HashMap<N, usize>,
    total: usize,
}

impl<N> SiblingGroup<N>
where
    N: Clone + Eq + Hash,
{
    /// Builds a group from entries that are already in display order.
    pub(crate) fn new(entries: Vec<Entry<N>>) -> Self {
        let mut group = Self {
            total: entries.iter().map(|e| e.span).sum(),
            entries,
            positions: HashMap::new(),
        };
        group.reindex();
        group
    }

    fn reindex(&mut self) {
        self.positions.clear();
        self.positions.reserve(self.entries.len());
        for (position, entry) in self.entries.iter().enumerate() {
            self.positions.insert(entry.node.clone(), position);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn entry(&self, position: usize) -> &Entry<N> {
        &self.entries[position]
    }

    pub(crate) fn entries(&self) -> &[Entry<N>] {
        &self.entries
    }

    pub(crate) fn position(&self, node: &N) -> Option<usize> {
        self.positions.get(node).copied()
    }

    /// Rows taken by the members before `position`.
    pub(crate) fn offset_of(&self, position: usize) -> usize {
        self.entries[..position].iter().map(|e| e.span).sum()
    }

    /// Finds the member whose span covers `offset`.
    ///
    /// Returns the member position and the remaining offset inside its span,
    /// where `0` is the member itself.
    pub(crate) fn find_offset(&self, mut offset: usize) -> Option<(usize, usize)> {
        for (position, entry) in self.entries.iter().enumerate() {
            if offset < entry.span {
                return Some((position, offset));
            }
            offset -= entry.span;
        }
        None
    }

    pub(crate) fn grow(&mut self, position: usize, rows: usize) {
        self.entries[position].span += rows;
        self.total += rows;
    }

    pub(crate) fn shrink(&mut self, position: usize, rows: usize) {
        debug_assert!(
            self.entries[position].span > rows,
            "a member always keeps its own row"
        );
        self.entries[position].span -= rows;
        self.total -= rows;
    }

    /// Re-sorts members, keeping their spans.
    pub(crate) fn reorder(&mut self, order: Option<&dyn SiblingOrder<N>>) {
        sort_entries(&mut self.entries, order);
        self.reindex();
    }
}

/// Sorts by `order`, breaking ties by source ordinal, or restores source order.
pub(crate) fn sort_entries<N>(entries: &mut [Entry<N>], order: Option<&dyn SiblingOrder<N>>) {
    match order {
        Some(order) => entries.sort_by(|a, b| {
            order
                .compare(&a.node, &b.node)
                .then(a.ordinal.cmp(&b.ordinal))
        }),
        None => entries.sort_by_key(|entry| entry.ordinal),
    }
}
