// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage, lifecycle, properties, and the revision API.

use alloc::boxed::Box;
use alloc::vec::Vec;
use tracing::{debug, trace};

use crate::content::Content;
use crate::state::{GraphState, Revision};
use crate::transform::normalize_rotation;
use crate::types::{Geometry, NodeFlags, NodeId, NodeKind};

/// Counts of cache recomputations since the graph was created or
/// [`SceneGraph::reset_stats`] was last called.
///
/// Every read that is answered from a valid cache leaves these untouched, so they are a
/// direct measure of how much work a sequence of reads performed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    /// Local transforms composed from geometry.
    pub local_transforms: u64,
    /// World transforms composed from a parent's world transform.
    pub world_transforms: u64,
    /// Content measurements.
    pub local_bounds: u64,
    /// Local bounds projected into parent space.
    pub bounds: u64,
    /// World bounds aggregated over a subtree.
    pub world_bounds: u64,
}

#[derive(Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) kind: NodeKind,
    pub(crate) geometry: Geometry,
    pub(crate) flags: NodeFlags,
    pub(crate) content: Option<Box<dyn Content>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn new(generation: u32, kind: NodeKind) -> Self {
        Self {
            generation,
            kind,
            geometry: Geometry::default(),
            flags: NodeFlags::default(),
            content: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A scene graph whose derived geometry is recomputed on demand.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Each node carries a
/// lazily created cache record (its graph state) in a parallel array: revision counters
/// that mutations bump, and transform/bounds caches stamped against those counters.
/// Readers revalidate exactly the caches whose stamps no longer match.
///
/// Readers take `&mut self` because they fill caches.
pub struct SceneGraph {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    states: Vec<Option<GraphState>>,
    free_list: Vec<usize>,
    pub(crate) stats: RecomputeStats,
}

impl core::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let with_state = self.states.iter().filter(|s| s.is_some()).count();
        f.debug_struct("SceneGraph")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("nodes_with_state", &with_state)
            .field("free_list", &self.free_list.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            states: Vec::new(),
            free_list: Vec::new(),
            stats: RecomputeStats::default(),
        }
    }

    // --- lifecycle ---

    /// Create a detached node of the given kind.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind)));
            self.generations.push(generation);
            self.states.push(None);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        debug!(?id, ?kind, "created node");
        id
    }

    /// Create a detached container.
    pub fn create_container(&mut self) -> NodeId {
        self.create_node(NodeKind::Container)
    }

    /// Create a detached leaf.
    pub fn create_leaf(&mut self) -> NodeId {
        self.create_node(NodeKind::Leaf)
    }

    /// Destroy a node and its whole subtree.
    ///
    /// The node is first removed from its parent (which is invalidated like any other
    /// removal), then every id in the subtree becomes stale. Stale ids are ignored.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.detach(parent, id);
        }
        self.free_subtree(id);
        debug!(?id, "destroyed subtree");
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = Vec::from([id]);
        while let Some(n) = pending.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                pending.extend(node.children);
            }
            self.states[n.idx()] = None;
            self.free_list.push(n.idx());
        }
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// See [`NodeId`] docs for the generational semantics.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns the kind of a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    // --- properties ---

    /// Returns the geometry a node's local transform is derived from.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn geometry(&self, id: NodeId) -> Geometry {
        self.node(id).geometry
    }

    /// Horizontal translation.
    pub fn x(&self, id: NodeId) -> f64 {
        self.node(id).geometry.x
    }

    /// Vertical translation.
    pub fn y(&self, id: NodeId) -> f64 {
        self.node(id).geometry.y
    }

    /// Rotation in degrees, normalized into `(-180, 180]`.
    pub fn rotation(&self, id: NodeId) -> f64 {
        self.node(id).geometry.rotation
    }

    /// Horizontal scale.
    pub fn scale_x(&self, id: NodeId) -> f64 {
        self.node(id).geometry.scale_x
    }

    /// Vertical scale.
    pub fn scale_y(&self, id: NodeId) -> f64 {
        self.node(id).geometry.scale_y
    }

    /// Replace all geometry at once.
    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry) {
        self.update_geometry(id, |g| *g = geometry);
    }

    /// Set horizontal translation.
    pub fn set_x(&mut self, id: NodeId, x: f64) {
        self.update_geometry(id, |g| g.x = x);
    }

    /// Set vertical translation.
    pub fn set_y(&mut self, id: NodeId, y: f64) {
        self.update_geometry(id, |g| g.y = y);
    }

    /// Set both translations.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        self.update_geometry(id, |g| {
            g.x = x;
            g.y = y;
        });
    }

    /// Set rotation in degrees. Any value is accepted and stored normalized into `(-180, 180]`.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        self.update_geometry(id, |g| g.rotation = degrees);
    }

    /// Set horizontal scale.
    pub fn set_scale_x(&mut self, id: NodeId, scale_x: f64) {
        self.update_geometry(id, |g| g.scale_x = scale_x);
    }

    /// Set vertical scale.
    pub fn set_scale_y(&mut self, id: NodeId, scale_y: f64) {
        self.update_geometry(id, |g| g.scale_y = scale_y);
    }

    /// Set both scales.
    pub fn set_scale(&mut self, id: NodeId, scale_x: f64, scale_y: f64) {
        self.update_geometry(id, |g| {
            g.scale_x = scale_x;
            g.scale_y = scale_y;
        });
    }

    /// Applies `f` and bumps the local transform revision only if something changed.
    ///
    /// Values are compared bitwise so that re-setting a NaN is not a change.
    fn update_geometry(&mut self, id: NodeId, f: impl FnOnce(&mut Geometry)) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        let before = node.geometry;
        f(&mut node.geometry);
        node.geometry.rotation = normalize_rotation(node.geometry.rotation);
        if !node.geometry.same_bits(&before) {
            self.invalidate_local_transform(id);
        }
    }

    /// Returns a node's flags.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    /// Update flags. Flags are not geometry, so only the appearance revision moves.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        if node.flags != flags {
            node.flags = flags;
            self.invalidate_appearance(id);
        }
    }

    /// Returns the node's content, if any.
    pub fn content(&self, id: NodeId) -> Option<&dyn Content> {
        self.node(id).content.as_deref()
    }

    /// Replace the node's content.
    pub fn set_content(&mut self, id: NodeId, content: impl Content + 'static) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        node.content = Some(Box::new(content));
        self.invalidate_local_bounds(id);
    }

    /// Remove the node's content.
    pub fn clear_content(&mut self, id: NodeId) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        if node.content.take().is_some() {
            self.invalidate_local_bounds(id);
        }
    }

    // --- revision API ---

    /// Bump every revision of the node: appearance, local bounds and local transform.
    pub fn invalidate(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        let state = self.state_mut(id);
        state.appearance_id.bump();
        state.local_bounds_id.bump();
        state.local_transform_id.bump();
        self.invalidate_world_bounds(id);
    }

    /// Record a non-geometric visual change. No cache depends on this revision.
    pub fn invalidate_appearance(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.state_mut(id).appearance_id.bump();
    }

    /// Record that the node's own content bounds changed.
    ///
    /// Also resets the aggregate world bounds of every ancestor.
    pub fn invalidate_local_bounds(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.state_mut(id).local_bounds_id.bump();
        self.invalidate_world_bounds(id);
    }

    /// Record that x, y, rotation or scale changed.
    ///
    /// Also resets the aggregate world bounds of every ancestor.
    pub fn invalidate_local_transform(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.state_mut(id).local_transform_id.bump();
        self.invalidate_world_bounds(id);
    }

    /// Force the world transform to be recomputed against the current parent.
    pub fn invalidate_parent_cache(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.state_mut(id).world_transform.invalidate();
    }

    /// Force the world bounds of the node and of every ancestor to be recomputed.
    pub fn invalidate_world_bounds(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            if !self.is_alive(n) {
                return;
            }
            if let Some(state) = self.states[n.idx()].as_mut() {
                state.world_bounds.invalidate();
            }
            current = self.node(n).parent;
        }
    }

    /// Current appearance revision.
    pub fn appearance_id(&self, id: NodeId) -> u64 {
        self.revision(id, |s| s.appearance_id)
    }

    /// Current local bounds revision.
    pub fn local_bounds_id(&self, id: NodeId) -> u64 {
        self.revision(id, |s| s.local_bounds_id)
    }

    /// Current local transform revision.
    pub fn local_transform_id(&self, id: NodeId) -> u64 {
        self.revision(id, |s| s.local_transform_id)
    }

    /// Revision of the last computed world transform; children stamp against it.
    pub fn world_transform_id(&self, id: NodeId) -> u64 {
        self.revision(id, |s| s.world_transform_id)
    }

    fn revision(&self, id: NodeId, pick: impl FnOnce(&GraphState) -> Revision) -> u64 {
        let _ = self.node(id);
        self.states[id.idx()].as_ref().map(pick).unwrap_or_default().get()
    }

    /// Recomputation counters.
    pub fn stats(&self) -> RecomputeStats {
        self.stats
    }

    /// Zero the recomputation counters.
    pub fn reset_stats(&mut self) {
        self.stats = RecomputeStats::default();
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.idx()).and_then(|n| n.as_ref()) {
            Some(n) if n.generation == id.1 => n,
            _ => panic!("dangling NodeId: {id:?}"),
        }
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.idx()).and_then(|n| n.as_mut()) {
            Some(n) if n.generation == id.1 => n,
            _ => panic!("dangling NodeId: {id:?}"),
        }
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// The node's graph state, created on first use. `id` must be live.
    pub(crate) fn state_mut(&mut self, id: NodeId) -> &mut GraphState {
        self.states[id.idx()].get_or_insert_with(|| {
            trace!(?id, "created graph state");
            GraphState::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::QueryFilter;
    use kurbo::{Point, Rect};

    #[test]
    fn liveness_create_destroy_reuse() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let a = graph.create_leaf();
        graph.add_child(root, a).unwrap();
        assert!(graph.is_alive(root));
        assert!(graph.is_alive(a));

        graph.destroy(a);
        assert!(!graph.is_alive(a));
        assert!(graph.children(root).is_empty());

        // Reuse the slot; the old id must stay stale.
        let b = graph.create_leaf();
        assert!(graph.is_alive(b));
        assert!(!graph.is_alive(a));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
    }

    #[test]
    fn destroy_frees_whole_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create_container();
        let mid = graph.create_container();
        let leaf = graph.create_leaf();
        graph.add_child(root, mid).unwrap();
        graph.add_child(mid, leaf).unwrap();
        let before = graph.appearance_id(root);

        graph.destroy(mid);
        assert!(!graph.is_alive(mid));
        assert!(!graph.is_alive(leaf));
        assert!(graph.is_alive(root));
        assert!(graph.appearance_id(root) > before, "parent sees the removal");
    }

    #[test]
    fn fresh_nodes_report_zero_revisions_without_creating_state() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        assert_eq!(graph.appearance_id(n), 0);
        assert_eq!(graph.local_bounds_id(n), 0);
        assert_eq!(graph.local_transform_id(n), 0);
        assert_eq!(graph.world_transform_id(n), 0);
        assert!(graph.states[n.idx()].is_none(), "getters must not allocate state");
    }

    #[test]
    fn invalidate_appearance_only_touches_appearance() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.invalidate_appearance(n);
        assert_eq!(graph.appearance_id(n), 1);
        assert_eq!(graph.local_transform_id(n), 0);
        assert_eq!(graph.local_bounds_id(n), 0);
    }

    #[test]
    fn every_invalidation_strictly_increments() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        for round in 1..=3_u64 {
            graph.invalidate_appearance(n);
            graph.invalidate_local_bounds(n);
            graph.invalidate_local_transform(n);
            assert_eq!(graph.appearance_id(n), round);
            assert_eq!(graph.local_bounds_id(n), round);
            assert_eq!(graph.local_transform_id(n), round);
        }
        graph.invalidate(n);
        assert_eq!(graph.appearance_id(n), 4);
        assert_eq!(graph.local_bounds_id(n), 4);
        assert_eq!(graph.local_transform_id(n), 4);
    }

    #[test]
    fn setters_bump_only_on_change() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.set_x(n, 0.0);
        graph.set_scale(n, 1.0, 1.0);
        assert_eq!(graph.local_transform_id(n), 0, "unchanged values are not a change");
        graph.set_x(n, 3.0);
        assert_eq!(graph.local_transform_id(n), 1);
        graph.set_rotation(n, 360.0);
        assert_eq!(
            graph.local_transform_id(n),
            1,
            "a full turn normalizes to the stored angle"
        );
        graph.set_rotation(n, 45.0);
        assert_eq!(graph.local_transform_id(n), 2);
    }

    #[test]
    fn repeated_nan_is_not_a_change() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.set_x(n, f64::NAN);
        graph.set_x(n, f64::NAN);
        assert_eq!(graph.local_transform_id(n), 1);
        graph.set_y(n, 1.0);
        graph.set_y(n, 1.0);
        assert_eq!(graph.local_transform_id(n), 2, "NaN in x must not poison later checks");
        graph.set_rotation(n, -360.0);
        assert_eq!(graph.local_transform_id(n), 2, "-360 normalizes to the stored 0");
    }

    #[test]
    fn rotation_is_stored_normalized() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.set_rotation(n, 450.0);
        assert_eq!(graph.rotation(n), 90.0);
        graph.set_rotation(n, -270.0);
        assert_eq!(graph.rotation(n), 90.0);
        graph.set_rotation(n, -180.0);
        assert_eq!(graph.rotation(n), 180.0);
    }

    #[test]
    fn content_and_flags_drive_their_revisions() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.set_content(n, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(graph.local_bounds_id(n), 1);
        graph.clear_content(n);
        assert_eq!(graph.local_bounds_id(n), 2);
        graph.clear_content(n);
        assert_eq!(graph.local_bounds_id(n), 2, "clearing nothing is not a change");

        graph.set_flags(n, NodeFlags::VISIBLE);
        assert_eq!(graph.appearance_id(n), 1);
        assert_eq!(graph.local_transform_id(n), 0);
    }

    #[test]
    fn setters_ignore_stale_ids() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.destroy(n);
        graph.set_x(n, 5.0);
        graph.invalidate(n);
        graph.set_content(n, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(!graph.is_alive(n));
    }

    #[test]
    fn deep_chains_do_not_exhaust_the_stack() {
        const DEPTH: usize = 20_000;
        let mut graph = SceneGraph::new();
        let leaf = graph.create_leaf();
        graph.set_content(leaf, Rect::new(0.0, 0.0, 1.0, 1.0));
        // Built bottom-up so every attach targets a fresh root.
        let mut top = leaf;
        for _ in 0..DEPTH {
            let parent = graph.create_container();
            graph.set_x(parent, 1.0);
            graph.add_child(parent, top).unwrap();
            top = parent;
        }

        let depth = DEPTH as f64;
        assert_eq!(graph.world_transform(leaf).translation().x, depth);
        assert_eq!(
            graph.world_bounds_rect(top),
            Some(Rect::new(depth, 0.0, depth + 1.0, 1.0))
        );
        let point = Point::new(depth + 0.5, 0.5);
        let hit = graph.pick(top, point, QueryFilter::default()).unwrap();
        assert_eq!(hit.node, leaf);
        assert_eq!(hit.path.len(), DEPTH + 1);
        assert!(graph.hit_test_point(top, point, true));

        graph.destroy(top);
        assert!(!graph.is_alive(leaf));
        assert!(!graph.is_alive(top));
    }

    #[test]
    #[should_panic(expected = "dangling NodeId")]
    fn readers_panic_on_stale_ids() {
        let mut graph = SceneGraph::new();
        let n = graph.create_leaf();
        graph.destroy(n);
        let _ = graph.x(n);
    }
}
