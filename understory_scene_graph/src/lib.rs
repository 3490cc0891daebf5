// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene_graph --heading-base-level=0

//! Understory Scene Graph: a Kurbo-native scene graph with demand-driven cache invalidation.
//!
//! Understory Scene Graph is a building block for retained-mode renderers, canvas editors, and
//! anything else that keeps a hierarchy of transformed, measurable things around between frames.
//!
//! - Each node carries translation, rotation (degrees), and scale, plus optional [`Content`] that
//!   reports its own axis-aligned bounds.
//! - Local and world transforms, and local, parent-space, and world bounds are derived values,
//!   cached per node and recomputed only when a read finds them stale.
//! - Staleness is tracked with per-node revision counters rather than dirty flags, so a mutation
//!   costs a counter bump and a walk up the parent chain, never a walk down the subtree.
//!
//! ## Revisions and stamps
//!
//! Every node owns four counters: appearance, local bounds, local transform, and world transform.
//! Setters bump the counter that matches what they changed and nothing else. Each cache remembers
//! the counters it was computed from (its stamp); a read compares the stamp with the current
//! counters and recomputes only on mismatch. A world transform is stamped with the parent's
//! identity as well, so moving a node to another parent invalidates it without an extra flag.
//!
//! Nothing is pushed down the tree. Moving a grandparent bumps one counter; the first read of a
//! grandchild's world transform walks up, finds the changed parent stamp, and recomputes the chain.
//! World bounds aggregate over descendants, so changes there are pushed up to every ancestor.
//!
//! [`SceneGraph::stats`] counts recomputations of each cache kind, which makes "no unnecessary
//! work" something tests can assert.
//!
//! ## API overview
//!
//! - [`SceneGraph`]: arena of nodes with the mutation, query, and revision API.
//! - [`NodeId`]: generational handle of a node. Stale handles are rejected with
//!   [`GraphError::InvalidArgument`] by structural calls and ignored by setters.
//! - [`NodeKind`]: containers hold children, leaves do not.
//! - [`Content`]: measurement hook; implemented for [`kurbo::Rect`].
//! - [`Hit`] and [`QueryFilter`]: results and filters for [`SceneGraph::pick`].
//!
//! Key operations:
//! - [`SceneGraph::add_child_at`], [`SceneGraph::remove_child`], [`SceneGraph::set_child_index`],
//!   [`SceneGraph::swap_children`].
//! - [`SceneGraph::world_transform`], [`SceneGraph::world_bounds_rect`],
//!   [`SceneGraph::calculate_bounds_rect`].
//! - [`SceneGraph::local_to_global`], [`SceneGraph::global_to_local`].
//! - [`SceneGraph::hit_test_point`], [`SceneGraph::hit_test_object`], [`SceneGraph::pick`].
//!
//! Readers take `&mut self` because they fill caches.
//!
//! ### Minimal usage
//!
//! ```
//! use understory_scene_graph::{QueryFilter, RecomputeStats, SceneGraph};
//! use kurbo::{Point, Rect};
//!
//! let mut graph = SceneGraph::new();
//! let root = graph.create_container();
//! let card = graph.create_leaf();
//! graph.set_content(card, Rect::new(0.0, 0.0, 40.0, 20.0));
//! graph.add_child(root, card).unwrap();
//! graph.set_position(card, 100.0, 50.0);
//!
//! assert_eq!(
//!     graph.world_bounds_rect(root),
//!     Some(Rect::new(100.0, 50.0, 140.0, 70.0))
//! );
//!
//! // A second read is answered from the caches.
//! graph.reset_stats();
//! let _ = graph.world_bounds_rect(root);
//! assert_eq!(graph.stats(), RecomputeStats::default());
//!
//! // Quarter turns are exact.
//! graph.set_rotation(card, 90.0);
//! assert_eq!(
//!     graph.world_bounds_rect(root),
//!     Some(Rect::new(80.0, 50.0, 100.0, 90.0))
//! );
//!
//! let hit = graph.pick(root, Point::new(90.0, 60.0), QueryFilter::default()).unwrap();
//! assert_eq!(hit.node, card);
//! assert_eq!(hit.path, [root, card]);
//! ```
//!
//! ### Converting between spaces
//!
//! ```
//! use understory_scene_graph::{GraphError, SceneGraph};
//! use kurbo::Point;
//!
//! let mut graph = SceneGraph::new();
//! let root = graph.create_container();
//! let panel = graph.create_container();
//! graph.add_child(root, panel).unwrap();
//! graph.set_position(panel, 10.0, 20.0);
//! graph.set_scale(panel, 2.0, 2.0);
//!
//! let local = Point::new(5.0, 5.0);
//! let global = graph.local_to_global(panel, local);
//! assert_eq!(global, Point::new(20.0, 30.0));
//! assert_eq!(graph.global_to_local(panel, global), Ok(local));
//!
//! graph.set_scale_x(panel, 0.0);
//! assert_eq!(
//!     graph.global_to_local(panel, global),
//!     Err(GraphError::NonInvertible(panel))
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Recomputations are logged through [`tracing`] at
//! `trace` level and structural changes at `debug` level.

#![no_std]

extern crate alloc;

mod bounds;
mod cache;
mod children;
mod content;
mod error;
mod graph;
mod hit;
mod state;
mod transform;
mod types;
mod util;

pub use content::Content;
pub use error::{GraphError, Result};
pub use graph::{RecomputeStats, SceneGraph};
pub use hit::{Hit, QueryFilter};
pub use types::{Geometry, NodeFlags, NodeId, NodeKind};
