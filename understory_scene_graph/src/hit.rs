// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing against cached world geometry.

use alloc::vec::Vec;
use kurbo::{Affine, Point};

use crate::graph::SceneGraph;
use crate::types::{NodeFlags, NodeId};
use crate::util::invert;

/// Result of [`SceneGraph::pick`].
#[derive(Clone, Debug)]
pub struct Hit {
    /// The matched node.
    pub node: NodeId,
    /// Path from the queried root to the node (inclusive).
    pub path: Vec<NodeId>,
}

/// Filters applied during [`SceneGraph::pick`].
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryFilter {
    /// If true, skip nodes not marked [`NodeFlags::VISIBLE`] together with their subtrees.
    pub visible_only: bool,
    /// If true, only return nodes marked [`NodeFlags::PICKABLE`].
    pub pickable_only: bool,
}

impl SceneGraph {
    /// Test a root-space point against a node.
    ///
    /// With `shape == false` the point is tested against [`world_bounds_rect`](Self::world_bounds_rect),
    /// which is conservative under rotation. With `shape == true` the point is mapped into
    /// each node's own space and tested against its content, for the node and every
    /// descendant.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn hit_test_point(&mut self, id: NodeId, point: Point, shape: bool) -> bool {
        if !self
            .world_bounds_rect(id)
            .is_some_and(|bounds| bounds.contains(point))
        {
            return false;
        }
        !shape || self.shape_contains(id, point)
    }

    /// Returns `true` if the world bounds of `a` and `b` overlap with positive area.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale.
    pub fn hit_test_object(&mut self, a: NodeId, b: NodeId) -> bool {
        let (Some(ra), Some(rb)) = (self.world_bounds_rect(a), self.world_bounds_rect(b)) else {
            return false;
        };
        let overlap = ra.intersect(rb);
        overlap.width() > 0.0 && overlap.height() > 0.0
    }

    /// Find the topmost node under a root-space point within `root`'s subtree.
    ///
    /// Later children are above earlier ones, and children are above their parent's own
    /// content. Only nodes whose content contains the point are candidates.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn pick(&mut self, root: NodeId, point: Point, filter: QueryFilter) -> Option<Hit> {
        let (world, _) = self.refresh_world_transform(root);
        let mut stack = Vec::new();
        if let Some(frame) = self.enter_pick(root, world, point, filter) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.remaining > 0 {
                frame.remaining -= 1;
                let (parent, parent_world) = (frame.id, frame.world);
                let child = self.node(parent).children[frame.remaining];
                let (child_world, _) =
                    self.refresh_world_transform_under(child, Some((parent, parent_world)));
                if let Some(child_frame) = self.enter_pick(child, child_world, point, filter) {
                    stack.push(child_frame);
                }
                continue;
            }

            let PickFrame { id, world, .. } = *frame;
            let pickable =
                !filter.pickable_only || self.node(id).flags.contains(NodeFlags::PICKABLE);
            if pickable && self.content_contains(id, world, point) {
                let path = stack.iter().map(|f| f.id).collect();
                return Some(Hit { node: id, path });
            }
            stack.pop();
        }
        None
    }

    /// A frame for `id` if its subtree can contain a hit for `point`.
    fn enter_pick(
        &mut self,
        id: NodeId,
        world: Affine,
        point: Point,
        filter: QueryFilter,
    ) -> Option<PickFrame> {
        let node = self.node(id);
        if filter.visible_only && !node.flags.contains(NodeFlags::VISIBLE) {
            return None;
        }
        let remaining = node.children.len();
        let (bounds, _) = self.refresh_world_bounds_with(id, world);
        if !bounds.is_some_and(|bounds| bounds.contains(point)) {
            return None;
        }
        Some(PickFrame {
            id,
            world,
            remaining,
        })
    }

    fn shape_contains(&mut self, id: NodeId, point: Point) -> bool {
        let (world, _) = self.refresh_world_transform(id);
        let mut pending = Vec::from([(id, world)]);
        while let Some((n, world)) = pending.pop() {
            if self.content_contains(n, world, point) {
                return true;
            }
            for i in 0..self.node(n).children.len() {
                let child = self.node(n).children[i];
                let (child_world, _) = self.refresh_world_transform_under(child, Some((n, world)));
                pending.push((child, child_world));
            }
        }
        false
    }

    /// Precise test of a root-space point against the node's own content.
    fn content_contains(&mut self, id: NodeId, world: Affine, point: Point) -> bool {
        let Some(local) = self.local_bounds_rect(id) else {
            return false;
        };
        match invert(world) {
            Some(inverse) => local.contains(inverse * point),
            None => false,
        }
    }
}

/// A node on the current pick path and how many of its children are left to visit.
#[derive(Clone, Copy, Debug)]
struct PickFrame {
    id: NodeId,
    world: Affine,
    /// Children are visited topmost first, so this counts down.
    remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn leaf_with(graph: &mut SceneGraph, content: Rect) -> NodeId {
        let leaf = graph.create_leaf();
        graph.set_content(leaf, content);
        leaf
    }

    #[test]
    fn shape_test_is_tighter_than_bounds_under_rotation() {
        let mut graph = SceneGraph::new();
        let diamond = leaf_with(&mut graph, Rect::new(-10.0, -10.0, 10.0, 10.0));
        graph.set_rotation(diamond, 45.0);
        // Near the corner of the AABB but outside the rotated square.
        let corner = Point::new(13.0, 13.0);
        assert!(graph.hit_test_point(diamond, corner, false));
        assert!(!graph.hit_test_point(diamond, corner, true));
        assert!(graph.hit_test_point(diamond, Point::ORIGIN, true));
    }

    #[test]
    fn shape_test_descends_into_children() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let a = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        graph.set_x(b, 30.0);
        graph.add_child(root, a).unwrap();
        graph.add_child(root, b).unwrap();

        assert!(graph.hit_test_point(root, Point::new(35.0, 5.0), true));
        // Inside the union but in the gap between children.
        assert!(graph.hit_test_point(root, Point::new(20.0, 5.0), false));
        assert!(!graph.hit_test_point(root, Point::new(20.0, 5.0), true));
    }

    #[test]
    fn object_hit_needs_positive_overlap() {
        let mut graph = SceneGraph::new();
        let a = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        let empty = graph.create_container();
        graph.set_x(b, 5.0);
        assert!(graph.hit_test_object(a, b));
        graph.set_x(b, 10.0);
        assert!(!graph.hit_test_object(a, b), "touching edges do not overlap");
        assert!(!graph.hit_test_object(a, empty));
    }

    #[test]
    fn pick_prefers_later_children() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let below = leaf_with(&mut graph, Rect::new(0.0, 0.0, 100.0, 100.0));
        let above = leaf_with(&mut graph, Rect::new(40.0, 40.0, 120.0, 120.0));
        graph.add_child(root, below).unwrap();
        graph.add_child(root, above).unwrap();

        let hit = graph
            .pick(root, Point::new(50.0, 50.0), QueryFilter::default())
            .unwrap();
        assert_eq!(hit.node, above, "last child is on top");
        assert_eq!(hit.path, [root, above]);

        graph.swap_children(root, below, above).unwrap();
        let hit = graph
            .pick(root, Point::new(50.0, 50.0), QueryFilter::default())
            .unwrap();
        assert_eq!(hit.node, below, "reorder changes stacking");
    }

    #[test]
    fn warm_pick_recomputes_nothing() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let group = graph.create_container();
        let leaf = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        graph.set_position(group, 5.0, 5.0);
        graph.add_child(root, group).unwrap();
        graph.add_child(group, leaf).unwrap();
        let pt = Point::new(7.0, 7.0);
        assert_eq!(graph.pick(root, pt, QueryFilter::default()).unwrap().node, leaf);

        graph.reset_stats();
        assert_eq!(graph.pick(root, pt, QueryFilter::default()).unwrap().node, leaf);
        assert_eq!(graph.stats(), crate::graph::RecomputeStats::default());

        graph.set_x(group, 50.0);
        assert!(graph.pick(root, pt, QueryFilter::default()).is_none());
        assert_eq!(graph.stats().world_transforms, 2, "group and leaf");
    }

    #[test]
    fn pick_honors_filter() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let group = graph.create_container();
        let leaf = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        let backdrop = leaf_with(&mut graph, Rect::new(0.0, 0.0, 10.0, 10.0));
        graph.add_child(root, backdrop).unwrap();
        graph.add_child(root, group).unwrap();
        graph.add_child(group, leaf).unwrap();

        let filter = QueryFilter {
            visible_only: true,
            pickable_only: true,
        };
        let pt = Point::new(5.0, 5.0);
        let hit = graph.pick(root, pt, filter).unwrap();
        assert_eq!(hit.node, leaf);
        assert_eq!(hit.path, [root, group, leaf]);

        graph.set_flags(leaf, NodeFlags::VISIBLE);
        assert_eq!(graph.pick(root, pt, filter).unwrap().node, backdrop);

        graph.set_flags(leaf, NodeFlags::default());
        graph.set_flags(group, NodeFlags::PICKABLE);
        assert_eq!(
            graph.pick(root, pt, filter).unwrap().node,
            backdrop,
            "invisible container hides its subtree"
        );
        assert_eq!(
            graph.pick(root, pt, QueryFilter::default()).unwrap().node,
            leaf,
            "no filter ignores flags"
        );
        assert!(graph.pick(root, Point::new(50.0, 50.0), filter).is_none());
    }
}
