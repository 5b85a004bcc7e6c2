// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hierarchy mapper: flat indices over an expandable tree.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::MapperError;
use crate::expansion::ExpansionState;
use crate::fetch::Fetch;
use crate::filter::{Composition, FilterMode, SiblingOrder, VisibilityFilter};
use crate::group::{Entry, SiblingGroup};
use crate::source::HierarchySource;

/// Inline capacity for ancestor chains; deeper trees spill to the heap.
const INLINE_DEPTH: usize = 8;

type Chain<N> = SmallVec<[N; INLINE_DEPTH]>;

/// Where a visible node sits: one step per level, from the roots down.
type Path<N> = SmallVec<[Step<N>; INLINE_DEPTH]>;

#[derive(Clone, Debug)]
struct Step<N> {
    /// Key of the group the node lives in (`None` for the roots).
    parent: Option<N>,
    /// Position of the node inside that group.
    position: usize,
}

/// A sibling group under construction.
struct Frame<N> {
    parent: Option<N>,
    entries: Vec<Entry<N>>,
    /// Next member to visit.
    next: usize,
}

/// Maps an expandable hierarchy onto a flat, zero-based row space.
///
/// The mapper pulls sibling groups from a [`HierarchySource`] only when they
/// become visible, caches their filtered and sorted members together with the
/// number of rows each member occupies, and keeps those counts up to date as
/// nodes are expanded and collapsed. Positional queries walk one path through
/// the tree and never enumerate the flat sequence.
///
/// Queries take `&mut self` because they may fill the cache. The mapper is
/// meant to be owned by a single view.
///
/// # Example
///
/// ```
/// use understory_hierarchy::{HierarchyMapper, TreeData};
///
/// let mut data = TreeData::new();
/// data.add_items(None, ["a", "b"]).unwrap();
/// data.add_items(Some(&"a"), ["a1", "a2"]).unwrap();
///
/// let mut mapper = HierarchyMapper::new(&data);
/// assert_eq!(mapper.tree_size().unwrap(), 2);
///
/// // The host reports the row index it currently shows the node at.
/// let inserted = mapper.expand(&"a", 0).unwrap();
/// assert_eq!(inserted, 1..3);
/// assert_eq!(mapper.tree_size().unwrap(), 4);
/// assert_eq!(mapper.index_of(&"b").unwrap(), 3);
///
/// let rows: Vec<_> = mapper.fetch(1..4).unwrap().copied().collect();
/// assert_eq!(rows, ["a1", "a2", "b"]);
/// ```
pub struct HierarchyMapper<S>
where
    S: HierarchySource,
{
    source: S,
    expanded: ExpansionState<S::Node>,
    composition: Composition<S::Node>,
    /// Cached root group. When present, every visible expanded group below it
    /// is cached as well.
    root: Option<SiblingGroup<S::Node>>,
    /// Cached child groups keyed by parent.
    groups: HashMap<S::Node, SiblingGroup<S::Node>>,
}

impl<S> fmt::Debug for HierarchyMapper<S>
where
    S: HierarchySource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchyMapper")
            .field("expanded", &self.expanded.len())
            .field("composition", &self.composition)
            .field("rows", &self.root.as_ref().map(SiblingGroup::total))
            .field("cached_groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl<S> HierarchyMapper<S>
where
    S: HierarchySource,
{
    /// Creates a mapper with every node collapsed, no filter, and source order.
    pub fn new(source: S) -> Self {
        Self {
            source,
            expanded: ExpansionState::new(),
            composition: Composition::default(),
            root: None,
            groups: HashMap::new(),
        }
    }

    /// Builder-style variant of [`set_filter`](Self::set_filter).
    #[must_use]
    pub fn with_filter(mut self, filter: impl VisibilityFilter<S::Node> + 'static) -> Self {
        self.set_filter(filter);
        self
    }

    /// Builder-style variant of [`set_filter_mode`](Self::set_filter_mode).
    #[must_use]
    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.set_filter_mode(mode);
        self
    }

    /// Builder-style variant of [`set_sorting`](Self::set_sorting).
    #[must_use]
    pub fn with_sorting(mut self, order: impl SiblingOrder<S::Node> + 'static) -> Self {
        self.set_sorting(order);
        self
    }

    /// Builder-style variant of [`set_expanded`](Self::set_expanded).
    #[must_use]
    pub fn with_expanded(mut self, nodes: impl IntoIterator<Item = S::Node>) -> Self {
        self.set_expanded(nodes);
        self
    }

    /// Returns the hierarchy source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the hierarchy source mutably.
    ///
    /// Cached groups are not updated by changes made through this reference;
    /// follow them with [`refresh_children`](Self::refresh_children) or
    /// [`refresh_all`](Self::refresh_all).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the current expansion state.
    pub fn expanded(&self) -> &ExpansionState<S::Node> {
        &self.expanded
    }

    /// Returns `true` if `node` is marked expanded, whether or not it is visible.
    pub fn is_expanded(&self, node: &S::Node) -> bool {
        self.expanded.contains(node)
    }

    /// Returns the active filter mode.
    pub fn filter_mode(&self) -> FilterMode {
        self.composition.mode()
    }

    /// Total number of visible rows.
    ///
    /// The first call after construction or a filter change walks the root
    /// group and every expanded group below it; later calls are O(1).
    pub fn tree_size(&mut self) -> Result<usize, MapperError<S::Error>> {
        Ok(self.ensure_group(None)?)
    }

    /// Flat index of `node`.
    ///
    /// Fails with [`MapperError::NotFound`] if the node is filtered out, has a
    /// collapsed ancestor, or does not lead up to a root.
    pub fn index_of(&mut self, node: &S::Node) -> Result<usize, MapperError<S::Error>> {
        let chain = self.ancestors(node)?;
        let path = self.locate(&chain)?.ok_or(MapperError::NotFound)?;
        self.index_on_path(&path).ok_or(MapperError::NotFound)
    }

    /// Flat index of the parent of `node`.
    ///
    /// Fails with [`MapperError::NotFound`] for roots and for parents that are
    /// not visible.
    pub fn parent_index_of(&mut self, node: &S::Node) -> Result<usize, MapperError<S::Error>> {
        let parent = self.source.parent(node)?.ok_or(MapperError::NotFound)?;
        self.index_of(&parent)
    }

    /// Number of ancestors of `node` in the source; `0` for roots.
    ///
    /// Useful for indentation. Does not check visibility.
    pub fn depth(&self, node: &S::Node) -> Result<usize, MapperError<S::Error>> {
        Ok(self.ancestors(node)?.len() - 1)
    }

    /// Node shown at flat index `index`.
    pub fn node_at(&mut self, index: usize) -> Result<S::Node, MapperError<S::Error>> {
        let len = self.tree_size()?;
        if index >= len {
            return Err(MapperError::index_out_of_range(index, len));
        }
        let out_of_range = || MapperError::index_out_of_range(index, len);
        let mut parent: Option<&S::Node> = None;
        let mut offset = index;
        loop {
            let group = self.group(parent).ok_or_else(out_of_range)?;
            let (position, inner) = group.find_offset(offset).ok_or_else(out_of_range)?;
            let entry = group.entry(position);
            if inner == 0 {
                return Ok(entry.node.clone());
            }
            parent = Some(&entry.node);
            offset = inner - 1;
        }
    }

    /// Lazily yields the nodes at flat indices `range`, in order.
    ///
    /// The iterator descends to `range.start` once and then walks forward; it
    /// never touches nodes outside `range` and never calls the source. Clone it
    /// to restart from `range.start`.
    pub fn fetch(
        &mut self,
        range: Range<usize>,
    ) -> Result<Fetch<'_, S::Node>, MapperError<S::Error>> {
        let len = self.tree_size()?;
        if range.start > range.end || range.end > len {
            return Err(MapperError::RangeInvalid {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let this: &Self = self;
        let Some(root) = this.root.as_ref() else {
            return Ok(Fetch::empty(&this.groups));
        };
        Fetch::new(root, &this.groups, range.clone()).ok_or(MapperError::RangeInvalid {
            start: range.start,
            end: range.end,
            len,
        })
    }

    /// Returns the visible children of `parent` (or the roots) at positions
    /// `range` of that sibling group, after filtering and sorting.
    ///
    /// The parent does not need to be expanded or visible.
    pub fn fetch_children(
        &self,
        parent: Option<&S::Node>,
        range: Range<usize>,
    ) -> Result<Vec<S::Node>, MapperError<S::Error>> {
        let nodes: Vec<S::Node> = match self.group(parent) {
            Some(group) => group.entries().iter().map(|e| e.node.clone()).collect(),
            None => {
                let mut entries = self.composition.collect(&self.source, parent)?;
                self.composition.sort(&mut entries);
                entries.into_iter().map(|e| e.node).collect()
            }
        };
        if range.start > range.end || range.end > nodes.len() {
            return Err(MapperError::RangeInvalid {
                start: range.start,
                end: range.end,
                len: nodes.len(),
            });
        }
        Ok(nodes[range].to_vec())
    }

    /// Returns `true` if `node` has at least one child that passes the filter.
    pub fn has_children(&self, node: &S::Node) -> Result<bool, MapperError<S::Error>> {
        if let Some(group) = self.groups.get(node) {
            return Ok(!group.is_empty());
        }
        Ok(!self.composition.collect(&self.source, Some(node))?.is_empty())
    }

    /// Marks `node` expanded and reports the rows that became visible.
    ///
    /// `at` must be the node's current flat index, as the host displays it.
    /// The returned range starts right after it and covers every row now shown
    /// below the node, including rows of descendants that were expanded while
    /// hidden.
    ///
    /// Hidden nodes are still marked expanded, which takes effect once they
    /// become visible; for them, and for nodes that were already expanded,
    /// the returned range is empty.
    ///
    /// Fails with [`MapperError::RangeInvalid`] if the node is visible and
    /// `at` is not below [`tree_size`](Self::tree_size).
    pub fn expand(
        &mut self,
        node: &S::Node,
        at: usize,
    ) -> Result<Range<usize>, MapperError<S::Error>> {
        let chain = self.ancestors(node)?;
        let path = self.locate(&chain)?;
        if self.expanded.contains(node) {
            return Ok(Range::default());
        }
        let Some(path) = path else {
            self.expanded.insert(node.clone());
            log::debug!("expanded a hidden node at depth {}", chain.len() - 1);
            return Ok(Range::default());
        };
        self.check_row(at)?;
        self.expanded.insert(node.clone());
        let rows = match self.ensure_group(Some(node)) {
            Ok(rows) => rows,
            Err(err) => {
                self.expanded.remove(node);
                return Err(err.into());
            }
        };
        for step in &path {
            if let Some(group) = self.group_mut(step.parent.as_ref()) {
                group.grow(step.position, rows);
            }
        }
        log::debug!("expanded row {at}: inserted {rows} rows");
        Ok(at + 1..at + 1 + rows)
    }

    /// Marks `node` collapsed and reports the rows that disappeared.
    ///
    /// `at` must be the node's current flat index. Descendants keep their own
    /// expansion state, so expanding the node again restores the same shape.
    /// The cached groups below the node are dropped and read again on the next
    /// expansion.
    pub fn collapse(
        &mut self,
        node: &S::Node,
        at: usize,
    ) -> Result<Range<usize>, MapperError<S::Error>> {
        let chain = self.ancestors(node)?;
        let path = self.locate(&chain)?;
        if !self.expanded.contains(node) {
            return Ok(Range::default());
        }
        let Some(path) = path else {
            self.expanded.remove(node);
            log::debug!("collapsed a hidden node at depth {}", chain.len() - 1);
            return Ok(Range::default());
        };
        self.check_row(at)?;
        let rows = self.ensure_group(Some(node))?;
        self.expanded.remove(node);
        for step in &path {
            if let Some(group) = self.group_mut(step.parent.as_ref()) {
                group.shrink(step.position, rows);
            }
        }
        let dropped = self.evict_subtree(node);
        log::debug!("collapsed row {at}: removed {rows} rows, dropped {dropped} cached groups");
        Ok(at + 1..at + 1 + rows)
    }

    /// Like [`expand`](Self::expand), looking up the node's index first.
    pub fn expand_node(&mut self, node: &S::Node) -> Result<Range<usize>, MapperError<S::Error>> {
        let at = self.current_index(node)?;
        self.expand(node, at)
    }

    /// Like [`collapse`](Self::collapse), looking up the node's index first.
    pub fn collapse_node(
        &mut self,
        node: &S::Node,
    ) -> Result<Range<usize>, MapperError<S::Error>> {
        let at = self.current_index(node)?;
        self.collapse(node, at)
    }

    /// Replaces the visibility filter and drops every cached group.
    pub fn set_filter(&mut self, filter: impl VisibilityFilter<S::Node> + 'static) {
        self.composition.set_filter(Some(Box::new(filter)));
        self.invalidate_all("filter changed");
    }

    /// Removes the visibility filter and drops every cached group.
    pub fn clear_filter(&mut self) {
        if self.composition.has_filter() {
            self.composition.set_filter(None);
            self.invalidate_all("filter cleared");
        }
    }

    /// Chooses how the filter treats ancestors of matching nodes.
    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        if self.composition.mode() != mode {
            self.composition.set_mode(mode);
            if self.composition.has_filter() {
                self.invalidate_all("filter mode changed");
            }
        }
    }

    /// Sorts every sibling group with `order`.
    ///
    /// Row counts are unchanged; cached groups are re-ordered in place.
    pub fn set_sorting(&mut self, order: impl SiblingOrder<S::Node> + 'static) {
        self.composition.set_order(Some(Box::new(order)));
        self.reorder_cached();
    }

    /// Restores source order in every sibling group.
    pub fn clear_sorting(&mut self) {
        self.composition.set_order(None);
        self.reorder_cached();
    }

    /// Replaces the expansion state wholesale and drops every cached group.
    pub fn set_expanded(&mut self, nodes: impl IntoIterator<Item = S::Node>) {
        self.expanded.clear();
        for node in nodes {
            self.expanded.insert(node);
        }
        self.invalidate_all("expansion state replaced");
    }

    /// Collapses every node and drops every cached group.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.invalidate_all("collapsed all");
    }

    /// Forgets the cached children of `parent` (or the roots) so they are
    /// read from the source again on next use.
    ///
    /// Call this after the source changed that parent's child list. Groups
    /// below it and on the path above it are dropped as well since their row
    /// counts depend on it; unrelated groups stay cached.
    pub fn refresh_children(
        &mut self,
        parent: Option<&S::Node>,
    ) -> Result<(), MapperError<S::Error>> {
        let mut dropped = 0;
        if let Some(parent) = parent {
            let chain = self.ancestors(parent)?;
            dropped += self.evict_subtree(parent);
            for ancestor in &chain[1..] {
                dropped += usize::from(self.groups.remove(ancestor).is_some());
            }
        }
        self.root = None;
        log::debug!("refreshing children: dropped {dropped} cached groups");
        Ok(())
    }

    /// Drops every cached group; the expansion state is kept.
    pub fn refresh_all(&mut self) {
        self.invalidate_all("refresh requested");
    }

    fn current_index(&mut self, node: &S::Node) -> Result<usize, MapperError<S::Error>> {
        match self.index_of(node) {
            // Hidden nodes ignore the index.
            Err(MapperError::NotFound) => Ok(0),
            other => other,
        }
    }

    fn invalidate_all(&mut self, reason: &str) {
        log::debug!("dropping {} cached groups: {reason}", self.groups.len());
        self.root = None;
        self.groups.clear();
    }

    fn reorder_cached(&mut self) {
        let order = self.composition.order();
        if let Some(root) = self.root.as_mut() {
            root.reorder(order);
        }
        for group in self.groups.values_mut() {
            group.reorder(order);
        }
    }

    fn group(&self, parent: Option<&S::Node>) -> Option<&SiblingGroup<S::Node>> {
        match parent {
            None => self.root.as_ref(),
            Some(parent) => self.groups.get(parent),
        }
    }

    fn group_mut(&mut self, parent: Option<&S::Node>) -> Option<&mut SiblingGroup<S::Node>> {
        match parent {
            None => self.root.as_mut(),
            Some(parent) => self.groups.get_mut(parent),
        }
    }

    fn check_row(&self, at: usize) -> Result<(), MapperError<S::Error>> {
        let len = self.root.as_ref().map_or(0, SiblingGroup::total);
        if at < len {
            Ok(())
        } else {
            Err(MapperError::index_out_of_range(at, len))
        }
    }

    /// Makes sure the group of `parent` is cached and returns its row total.
    ///
    /// Building a group also builds the groups of its expanded members, since
    /// their totals are part of the member spans. Nothing built by a call whose
    /// source access fails stays cached.
    fn ensure_group(&mut self, parent: Option<&S::Node>) -> Result<usize, S::Error> {
        if let Some(group) = self.group(parent) {
            return Ok(group.total());
        }
        let mut built = Vec::new();
        let result = self.build_groups(parent, &mut built);
        if result.is_err() {
            for node in &built {
                self.groups.remove(node);
            }
        }
        result
    }

    /// Builds the group of `parent` and every missing group of its expanded
    /// members, depth-first with an explicit stack.
    ///
    /// Child groups are cached as they complete and their keys recorded in
    /// `built`.
    fn build_groups(
        &mut self,
        parent: Option<&S::Node>,
        built: &mut Vec<S::Node>,
    ) -> Result<usize, S::Error> {
        let mut stack = vec![Frame {
            entries: self.composition.collect(&self.source, parent)?,
            parent: parent.cloned(),
            next: 0,
        }];
        let mut total = 0;
        while let Some(frame) = stack.last_mut() {
            if let Some(entry) = frame.entries.get_mut(frame.next) {
                frame.next += 1;
                if !self.expanded.contains(&entry.node) {
                    continue;
                }
                if let Some(group) = self.groups.get(&entry.node) {
                    entry.span += group.total();
                    continue;
                }
                let node = entry.node.clone();
                let entries = self.composition.collect(&self.source, Some(&node))?;
                stack.push(Frame {
                    entries,
                    parent: Some(node),
                    next: 0,
                });
                continue;
            }

            let Some(Frame {
                mut entries,
                parent,
                ..
            }) = stack.pop()
            else {
                break;
            };
            self.composition.sort(&mut entries);
            let group = SiblingGroup::new(entries);
            total = group.total();
            log::trace!("cached group: {} members, {total} rows", group.len());
            match parent {
                None => self.root = Some(group),
                Some(parent) => {
                    built.push(parent.clone());
                    self.groups.insert(parent, group);
                }
            }
            // The member that opened this frame is the last one visited.
            if let Some(up) = stack.last_mut() {
                up.entries[up.next - 1].span += total;
            }
        }
        Ok(total)
    }

    /// Drops the cached group of `node` and of every expanded node below it.
    ///
    /// Returns the number of groups dropped.
    fn evict_subtree(&mut self, node: &S::Node) -> usize {
        let mut dropped = 0;
        let mut pending = vec![node.clone()];
        while let Some(next) = pending.pop() {
            let Some(group) = self.groups.remove(&next) else {
                continue;
            };
            dropped += 1;
            pending.extend(
                group
                    .entries()
                    .iter()
                    .filter(|entry| self.expanded.contains(&entry.node))
                    .map(|entry| entry.node.clone()),
            );
        }
        dropped
    }

    /// Returns `node` followed by its ancestors, ending with a root.
    fn ancestors(&self, node: &S::Node) -> Result<Chain<S::Node>, S::Error> {
        let mut chain = Chain::new();
        chain.push(node.clone());
        let mut current = node.clone();
        while let Some(parent) = self.source.parent(&current)? {
            chain.push(parent.clone());
            current = parent;
        }
        Ok(chain)
    }

    /// Resolves the position of `chain[0]` in every group from the roots down,
    /// or `None` if the node is not visible.
    fn locate(&mut self, chain: &[S::Node]) -> Result<Option<Path<S::Node>>, S::Error> {
        let mut path = Path::new();
        let mut parent: Option<&S::Node> = None;
        for node in chain.iter().rev() {
            if let Some(parent) = parent {
                if !self.expanded.contains(parent) {
                    return Ok(None);
                }
            }
            self.ensure_group(parent)?;
            let Some(position) = self.group(parent).and_then(|group| group.position(node)) else {
                return Ok(None);
            };
            path.push(Step {
                parent: parent.cloned(),
                position,
            });
            parent = Some(node);
        }
        Ok(Some(path))
    }

    fn index_on_path(&self, path: &[Step<S::Node>]) -> Option<usize> {
        let mut index = 0;
        for (depth, step) in path.iter().enumerate() {
            let group = self.group(step.parent.as_ref())?;
            index += group.offset_of(step.position) + usize::from(depth > 0);
        }
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeData;
    use alloc::vec;

    /// Roots 1, 2; children 10, 11 / 20, 21; grandchildren 100, 101 / 110, 111 / ...
    fn data() -> TreeData<u32> {
        let mut data = TreeData::new();
        data.add_items_with([1, 2], |&n| {
            if n < 100 {
                vec![n * 10, n * 10 + 1]
            } else {
                vec![]
            }
        })
        .unwrap();
        data
    }

    #[test]
    fn groups_load_lazily() {
        let data = data();
        let mut mapper = HierarchyMapper::new(&data);
        assert!(mapper.root.is_none());
        assert_eq!(mapper.tree_size().unwrap(), 2);
        assert!(mapper.groups.is_empty());

        mapper.expand(&1, 0).unwrap();
        assert_eq!(mapper.groups.len(), 1);
        assert!(mapper.groups.contains_key(&1));
    }

    #[test]
    fn collapse_drops_groups_below_the_node() {
        let data = data();
        let mut mapper = HierarchyMapper::new(&data);
        mapper.tree_size().unwrap();
        let before = mapper.groups.len();

        mapper.expand_node(&1).unwrap();
        mapper.expand_node(&10).unwrap();
        mapper.expand_node(&2).unwrap();
        assert_eq!(mapper.groups.len(), before + 3);

        assert_eq!(mapper.collapse_node(&1).unwrap(), 1..5);
        assert!(!mapper.groups.contains_key(&1));
        assert!(!mapper.groups.contains_key(&10));
        assert!(mapper.groups.contains_key(&2));
        // Descendants keep their own state.
        assert!(mapper.is_expanded(&10));

        // Nothing below a collapsed node is cached, so hidden toggles are
        // picked up on the next expansion.
        assert_eq!(mapper.collapse_node(&10).unwrap(), 0..0);
        assert_eq!(mapper.expand_node(&1).unwrap(), 1..3);
        assert_eq!(mapper.tree_size().unwrap(), 6);

        mapper.collapse_node(&1).unwrap();
        mapper.collapse_node(&2).unwrap();
        assert_eq!(mapper.groups.len(), before);
        assert_eq!(mapper.tree_size().unwrap(), 2);
    }

    #[test]
    fn repeated_round_trips_do_not_grow_the_cache() {
        let mut data = TreeData::new();
        data.add_items_with(0..200_u32, |&n| {
            if n < 200 {
                (0..20).map(|i| 1000 + n * 20 + i).collect()
            } else {
                vec![]
            }
        })
        .unwrap();
        let mut mapper = HierarchyMapper::new(&data);
        assert_eq!(mapper.tree_size().unwrap(), 200);

        for root in 0..200 {
            let at = mapper.index_of(&root).unwrap();
            assert_eq!(mapper.expand(&root, at).unwrap().len(), 20);
            assert_eq!(mapper.collapse(&root, at).unwrap().len(), 20);
        }
        assert!(mapper.groups.is_empty());
        assert_eq!(mapper.tree_size().unwrap(), 200);
    }

    #[test]
    fn failed_nested_load_caches_nothing() {
        struct Flaky(TreeData<u32>);

        impl HierarchySource for Flaky {
            type Node = u32;
            type Error = &'static str;

            fn children(&self, parent: Option<&u32>) -> Result<Vec<u32>, &'static str> {
                match parent {
                    Some(&11) => Err("offline"),
                    _ => Ok(self.0.children_of(parent).to_vec()),
                }
            }

            fn parent(&self, node: &u32) -> Result<Option<u32>, &'static str> {
                Ok(self.0.parent_of(node).copied())
            }
        }

        // 10 loads fine before 11 fails.
        let mut mapper = HierarchyMapper::new(Flaky(data())).with_expanded([10, 11]);
        assert_eq!(mapper.expand(&1, 0), Err(MapperError::Source("offline")));
        assert!(!mapper.is_expanded(&1));
        assert!(mapper.groups.is_empty());
        assert_eq!(mapper.tree_size(), Ok(2));
    }

    #[test]
    fn filter_hidden_toggle_keeps_visible_groups() {
        let data = data();
        let mut mapper = HierarchyMapper::new(&data).with_filter(|n: &u32| *n != 10);
        mapper.expand(&1, 0).unwrap();
        assert_eq!(mapper.tree_size().unwrap(), 3);

        assert_eq!(mapper.expand(&10, 0).unwrap(), 0..0);
        assert!(mapper.groups.contains_key(&1));
        assert_eq!(mapper.tree_size().unwrap(), 3);
    }

    #[test]
    fn sorting_reorders_without_dropping_groups() {
        let data = data();
        let mut mapper = HierarchyMapper::new(&data);
        mapper.expand(&1, 0).unwrap();
        mapper.expand(&2, 3).unwrap();
        let cached = mapper.groups.len();

        mapper.set_sorting(|a: &u32, b: &u32| b.cmp(a));
        assert_eq!(mapper.groups.len(), cached);
        assert!(mapper.root.is_some());
        assert_eq!(mapper.index_of(&2).unwrap(), 0);
        assert_eq!(mapper.index_of(&1).unwrap(), 3);

        mapper.clear_sorting();
        assert_eq!(mapper.index_of(&1).unwrap(), 0);
    }

    #[test]
    fn refresh_children_drops_only_the_ancestor_path() {
        let data = data();
        let mut mapper = HierarchyMapper::new(&data);
        mapper.expand_node(&1).unwrap();
        mapper.expand_node(&10).unwrap();
        mapper.expand_node(&2).unwrap();

        mapper.refresh_children(Some(&10)).unwrap();
        assert!(mapper.root.is_none());
        assert!(!mapper.groups.contains_key(&10));
        assert!(!mapper.groups.contains_key(&1));
        assert!(mapper.groups.contains_key(&2));
        assert_eq!(mapper.tree_size().unwrap(), 8);
    }

    #[test]
    fn failed_group_load_leaves_state_untouched() {
        struct Flaky(TreeData<u32>);

        impl HierarchySource for Flaky {
            type Node = u32;
            type Error = &'static str;

            fn children(&self, parent: Option<&u32>) -> Result<Vec<u32>, &'static str> {
                match parent {
                    Some(&2) => Err("offline"),
                    _ => Ok(self.0.children_of(parent).to_vec()),
                }
            }

            fn parent(&self, node: &u32) -> Result<Option<u32>, &'static str> {
                Ok(self.0.parent_of(node).copied())
            }
        }

        let mut mapper = HierarchyMapper::new(Flaky(data()));
        assert_eq!(mapper.expand(&2, 1), Err(MapperError::Source("offline")));
        assert!(!mapper.is_expanded(&2));
        assert!(!mapper.groups.contains_key(&2));
        assert_eq!(mapper.tree_size(), Ok(2));
    }
}
