// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily revalidated bounds.
//!
//! - Local bounds: the node's own content in its own space.
//! - Bounds: local bounds in the parent's space. Depends on both local revisions.
//! - World bounds: the node's content in root space unioned with the world bounds of
//!   every child. This is the one cache that depends on the child list, so it is
//!   validated leaf-ward and invalidated upward by every mutation below it.

use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect};
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::graph::SceneGraph;
use crate::types::NodeId;
use crate::util::{invert, transform_rect_bbox, union_opt};

impl SceneGraph {
    /// Bring the local bounds up to date. Returns `true` if the content was measured.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn ensure_local_bounds_rect(&mut self, id: NodeId) -> bool {
        self.refresh_local_bounds(id).1
    }

    /// The node's own content bounds in its own space, or `None` without content.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn local_bounds_rect(&mut self, id: NodeId) -> Option<Rect> {
        self.refresh_local_bounds(id).0
    }

    /// Bring the parent-space bounds up to date. Returns `true` if they were recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn ensure_bounds_rect(&mut self, id: NodeId) -> bool {
        self.refresh_bounds(id).1
    }

    /// The node's own content bounds in its parent's space.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn bounds_rect(&mut self, id: NodeId) -> Option<Rect> {
        self.refresh_bounds(id).0
    }

    /// Bring the world bounds of the node's subtree up to date.
    /// Returns `true` if this node's world bounds were recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn ensure_world_bounds_rect(&mut self, id: NodeId) -> bool {
        self.refresh_world_bounds(id).1
    }

    /// Bounds of the node's content and all its descendants' content in root space.
    ///
    /// Returns `None` when nothing in the subtree has content.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn world_bounds_rect(&mut self, id: NodeId) -> Option<Rect> {
        self.refresh_world_bounds(id).0
    }

    /// Bounds of `source`'s own content expressed in `target_space`'s coordinate space.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NonInvertible`] if the world transform of `target_space` is
    /// singular.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn calculate_bounds_rect(
        &mut self,
        source: NodeId,
        target_space: NodeId,
    ) -> Result<Option<Rect>> {
        if source == target_space {
            return Ok(self.local_bounds_rect(source));
        }
        if self.node(source).parent == Some(target_space) {
            return Ok(self.bounds_rect(source));
        }
        let Some(local) = self.local_bounds_rect(source) else {
            return Ok(None);
        };
        let source_to_target = self.relative_transform(source, target_space)?;
        Ok(Some(transform_rect_bbox(source_to_target, local)))
    }

    /// Map a point from the node's space into root space.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn local_to_global(&mut self, id: NodeId, point: Point) -> Point {
        self.world_transform(id) * point
    }

    /// Map a point from root space into the node's space.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NonInvertible`] if the node's world transform is singular.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn global_to_local(&mut self, id: NodeId, point: Point) -> Result<Point> {
        let inverse = invert(self.world_transform(id)).ok_or(GraphError::NonInvertible(id))?;
        Ok(inverse * point)
    }

    /// `inverse(target world) * source world`: maps `source` space into `target` space.
    fn relative_transform(&mut self, source: NodeId, target: NodeId) -> Result<Affine> {
        let target_world = self.world_transform(target);
        let target_inverse = invert(target_world).ok_or(GraphError::NonInvertible(target))?;
        Ok(target_inverse * self.world_transform(source))
    }

    pub(crate) fn refresh_local_bounds(&mut self, id: NodeId) -> (Option<Rect>, bool) {
        let key = self.state_mut(id).local_bounds_id;
        if let Some(rect) = self.state_mut(id).local_bounds.get(&key) {
            return (*rect, false);
        }
        let measured = self.node(id).content.as_ref().and_then(|c| c.measure());
        self.state_mut(id).local_bounds.store(key, measured);
        self.stats.local_bounds += 1;
        trace!(?id, ?measured, "measured content");
        (measured, true)
    }

    pub(crate) fn refresh_bounds(&mut self, id: NodeId) -> (Option<Rect>, bool) {
        let key = self.state_mut(id).bounds_key();
        if let Some(rect) = self.state_mut(id).bounds.get(&key) {
            return (*rect, false);
        }
        let (local, _) = self.refresh_local_bounds(id);
        let rect = match local {
            Some(local) => {
                let (transform, _) = self.refresh_local_transform(id);
                Some(transform_rect_bbox(transform, local))
            }
            None => None,
        };
        self.state_mut(id).bounds.store(key, rect);
        self.stats.bounds += 1;
        trace!(?id, "recomputed bounds");
        (rect, true)
    }

    pub(crate) fn refresh_world_bounds(&mut self, id: NodeId) -> (Option<Rect>, bool) {
        let (world, _) = self.refresh_world_transform(id);
        self.refresh_world_bounds_with(id, world)
    }

    /// Revalidate world bounds given the node's already valid world transform.
    ///
    /// Stale subtrees are aggregated post-order on an explicit stack, so depth is bounded
    /// by memory rather than by the call stack.
    pub(crate) fn refresh_world_bounds_with(
        &mut self,
        id: NodeId,
        world: Affine,
    ) -> (Option<Rect>, bool) {
        if let Some(rect) = self.valid_world_bounds(id) {
            return (rect, false);
        }

        let mut stack = Vec::new();
        stack.push(self.open_world_bounds(id, world));
        let mut result = None;
        while let Some(frame) = stack.last_mut() {
            let children = &self.node(frame.id).children;
            if let Some(&child) = children.get(frame.next_child) {
                frame.next_child += 1;
                let (parent, parent_world) = (frame.id, frame.world);
                let (child_world, _) =
                    self.refresh_world_transform_under(child, Some((parent, parent_world)));
                match self.valid_world_bounds(child) {
                    Some(child_rect) => {
                        if let Some(frame) = stack.last_mut() {
                            frame.rect = union_opt(frame.rect, child_rect);
                        }
                    }
                    None => {
                        let child_frame = self.open_world_bounds(child, child_world);
                        stack.push(child_frame);
                    }
                }
                continue;
            }

            let WorldBoundsFrame { id: done, rect, .. } = *frame;
            stack.pop();
            let key = self.state_mut(done).world_bounds_key();
            self.state_mut(done).world_bounds.store(key, rect);
            self.stats.world_bounds += 1;
            trace!(id = ?done, ?rect, "recomputed world bounds");
            match stack.last_mut() {
                Some(parent) => parent.rect = union_opt(parent.rect, rect),
                None => result = rect,
            }
        }
        (result, true)
    }

    /// Cached world bounds if they are valid for the node's current revisions.
    fn valid_world_bounds(&mut self, id: NodeId) -> Option<Option<Rect>> {
        let state = self.state_mut(id);
        let key = state.world_bounds_key();
        state.world_bounds.get(&key).copied()
    }

    /// Start aggregating a node: its own content in root space, no children yet.
    fn open_world_bounds(&mut self, id: NodeId, world: Affine) -> WorldBoundsFrame {
        let (local, _) = self.refresh_local_bounds(id);
        WorldBoundsFrame {
            id,
            world,
            rect: local.map(|local| transform_rect_bbox(world, local)),
            next_child: 0,
        }
    }
}

/// A node whose world bounds are being aggregated.
#[derive(Clone, Copy, Debug)]
struct WorldBoundsFrame {
    id: NodeId,
    world: Affine,
    rect: Option<Rect>,
    next_child: usize,
}
