// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily revalidated local and world transforms.
//!
//! Local transforms depend only on the node's own geometry revision. World transforms
//! depend on the local revision and on the parent's world revision, so validating one
//! walks toward the root first.

use alloc::vec::Vec;
use kurbo::{Affine, Vec2};
use tracing::trace;

use crate::graph::SceneGraph;
use crate::state::{GraphState, ParentStamp, RotationTrig, WorldTransformKey};
use crate::types::{Geometry, NodeId};

/// Normalize an angle in degrees into `(-180, 180]`.
pub(crate) fn normalize_rotation(degrees: f64) -> f64 {
    let r = degrees % 360.0;
    if r > 180.0 {
        r - 360.0
    } else if r <= -180.0 {
        r + 360.0
    } else {
        // Folds -0.0 into 0.0.
        r + 0.0
    }
}

impl RotationTrig {
    /// Sine and cosine of a normalized angle; cardinal angles are exact.
    pub(crate) fn new(degrees: f64) -> Self {
        let (sin, cos) = if degrees == 0.0 {
            (0.0, 1.0)
        } else if degrees == 90.0 {
            (1.0, 0.0)
        } else if degrees == -90.0 {
            (-1.0, 0.0)
        } else if degrees == 180.0 {
            (0.0, -1.0)
        } else {
            let v = Vec2::from_angle(degrees.to_radians());
            (v.y, v.x)
        };
        Self { degrees, sin, cos }
    }
}

fn compose_local(geometry: Geometry, trig: &mut RotationTrig) -> Affine {
    let degrees = normalize_rotation(geometry.rotation);
    if trig.degrees != degrees {
        *trig = RotationTrig::new(degrees);
    }
    let RotationTrig { sin, cos, .. } = *trig;
    Affine::new([
        cos * geometry.scale_x,
        sin * geometry.scale_x,
        -sin * geometry.scale_y,
        cos * geometry.scale_y,
        geometry.x,
        geometry.y,
    ])
}

impl SceneGraph {
    /// Bring the local transform up to date. Returns `true` if it was recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn ensure_local_transform(&mut self, id: NodeId) -> bool {
        self.refresh_local_transform(id).1
    }

    /// The transform from the node's space into its parent's space.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn local_transform(&mut self, id: NodeId) -> Affine {
        self.refresh_local_transform(id).0
    }

    /// Bring the world transform (and every ancestor's) up to date.
    /// Returns `true` if this node's world transform was recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn ensure_world_transform(&mut self, id: NodeId) -> bool {
        self.refresh_world_transform(id).1
    }

    /// The transform from the node's space into the space of its root.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn world_transform(&mut self, id: NodeId) -> Affine {
        self.refresh_world_transform(id).0
    }

    pub(crate) fn refresh_local_transform(&mut self, id: NodeId) -> (Affine, bool) {
        let geometry = self.node(id).geometry;
        let GraphState {
            local_transform_id,
            rotation,
            local_transform,
            ..
        } = self.state_mut(id);
        let (affine, recomputed) =
            local_transform.ensure(*local_transform_id, || compose_local(geometry, rotation));
        let affine = *affine;
        if recomputed {
            self.stats.local_transforms += 1;
            trace!(?id, "recomputed local transform");
        }
        (affine, recomputed)
    }

    pub(crate) fn refresh_world_transform(&mut self, id: NodeId) -> (Affine, bool) {
        let mut ancestors = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            ancestors.push(p);
            current = self.node(p).parent;
        }
        let mut parent = None;
        for &ancestor in ancestors.iter().rev() {
            let (world, _) = self.refresh_world_transform_under(ancestor, parent);
            parent = Some((ancestor, world));
        }
        self.refresh_world_transform_under(id, parent)
    }

    /// Revalidate `id` given its parent's already valid world transform.
    ///
    /// `parent` must be `None` for a root, or the node's current parent together with its
    /// up to date world transform.
    pub(crate) fn refresh_world_transform_under(
        &mut self,
        id: NodeId,
        parent: Option<(NodeId, Affine)>,
    ) -> (Affine, bool) {
        let parent_stamp = parent.map(|(p, _)| ParentStamp {
            parent: p,
            world_transform_id: self.state_mut(p).world_transform_id,
        });
        let state = self.state_mut(id);
        let key = WorldTransformKey {
            local_transform_id: state.local_transform_id,
            parent: parent_stamp,
        };
        if let Some(world) = state.world_transform.get(&key) {
            return (*world, false);
        }

        let (local, _) = self.refresh_local_transform(id);
        let world = match parent {
            Some((_, parent_world)) => parent_world * local,
            None => local,
        };
        let state = self.state_mut(id);
        state.world_transform.store(key, world);
        state.world_transform_id.bump();
        self.stats.world_transforms += 1;
        trace!(?id, "recomputed world transform");
        (world, true)
    }
}
