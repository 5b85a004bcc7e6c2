// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_hierarchy --heading-base-level=0

//! Understory Hierarchy: flat row indices over expandable trees.
//!
//! Virtualized lists address their content as a dense strip `0..len`. This
//! crate lets such a list show a tree: it maps between a node (plus the
//! expand state of its ancestors) and its row in the pre-order sequence of
//! visible nodes, without ever materializing that sequence.
//!
//! The core concepts are:
//!
//! - [`HierarchySource`]: where parent/child relations come from. Implement
//!   it over a database, a remote service, or use the in-memory [`TreeData`].
//! - [`HierarchyMapper`]: owns the [`ExpansionState`] and a cache of sibling
//!   groups with per-member row counts. It answers
//!   [`tree_size`](HierarchyMapper::tree_size),
//!   [`index_of`](HierarchyMapper::index_of),
//!   [`node_at`](HierarchyMapper::node_at), and
//!   [`fetch`](HierarchyMapper::fetch), and turns
//!   [`expand`](HierarchyMapper::expand) / [`collapse`](HierarchyMapper::collapse)
//!   into row insert/remove ranges.
//! - [`VisibilityFilter`] and [`SiblingOrder`]: optional predicate and
//!   per-sibling-group comparator. Sorting never compares nodes at different
//!   depths.
//!
//! This crate deliberately does **not** know about widgets or scrolling. Host
//! frameworks are responsible for:
//!
//! - Asking [`HierarchyMapper::tree_size`] for the strip length and
//!   [`HierarchyMapper::fetch`] for the rows in the viewport.
//! - Forwarding user expand/collapse gestures and applying the returned
//!   ranges to their own row models.
//! - Calling [`HierarchyMapper::refresh_children`] when the source data
//!   changes.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_hierarchy::{HierarchyMapper, TreeData};
//!
//! let mut data = TreeData::new();
//! data.add_items_with([1_u32, 2, 3], |&n| {
//!     if n < 10 { vec![n * 10, n * 10 + 1] } else { vec![] }
//! })
//! .unwrap();
//!
//! let mut mapper = HierarchyMapper::new(&data).with_sorting(|a: &u32, b: &u32| b.cmp(a));
//! assert_eq!(mapper.tree_size().unwrap(), 3);
//!
//! // Roots are sorted descending: 3, 2, 1. Expand `2`, shown at row 1.
//! assert_eq!(mapper.expand(&2, 1).unwrap(), 2..4);
//!
//! let rows: Vec<u32> = mapper.fetch(0..5).unwrap().copied().collect();
//! assert_eq!(rows, [3, 2, 21, 20, 1]);
//! assert_eq!(mapper.parent_index_of(&20).unwrap(), 1);
//! ```
//!
//! ## Costs
//!
//! Positional queries walk one path from a root to the node and scan the
//! sibling groups on that path, so they cost O(depth × siblings) regardless
//! of how many rows are visible. Expanding or collapsing a node updates the
//! cached counts along the same path. A group is read from the source the
//! first time it becomes visible; changing the filter drops every cached
//! group, changing the sort order only re-orders them.
//!
//! ## Logging
//!
//! Expansion deltas and cache invalidations are reported through the
//! [`log`](https://docs.rs/log) facade at `debug` level, group loads at
//! `trace` level. The crate never installs a logger.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod expansion;
mod fetch;
mod filter;
mod group;
mod mapper;
mod source;

pub use error::MapperError;
pub use expansion::ExpansionState;
pub use fetch::Fetch;
pub use filter::{FilterMode, SiblingOrder, VisibilityFilter};
pub use mapper::HierarchyMapper;
pub use source::{HierarchySource, TreeData, TreeDataError};
