// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node revision counters and the caches stamped against them.

use kurbo::{Affine, Rect};

use crate::cache::Cached;
use crate::types::NodeId;

/// A monotonic revision counter.
///
/// Revisions only ever move forward; a cached value records the revision(s) it was
/// computed from and is stale as soon as any of them moves.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct Revision(u64);

impl Revision {
    pub(crate) const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// The parent a world transform was derived from.
///
/// Recording the parent's identity next to its world revision means that switching
/// parents always invalidates, even if the new parent happens to be at the same revision.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct ParentStamp {
    pub(crate) parent: NodeId,
    pub(crate) world_transform_id: Revision,
}

/// Dependencies of a world transform: own local revision and the parent it sits under.
///
/// `parent: None` means the node was a root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct WorldTransformKey {
    pub(crate) local_transform_id: Revision,
    pub(crate) parent: Option<ParentStamp>,
}

/// Dependencies of parent-space bounds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct BoundsKey {
    pub(crate) local_bounds_id: Revision,
    pub(crate) local_transform_id: Revision,
}

/// Dependencies of world bounds, not counting the child list.
///
/// Changes below a node reach this cache through [`Cached::invalidate`] propagated
/// toward the root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct WorldBoundsKey {
    pub(crate) world_transform_id: Revision,
    pub(crate) local_bounds_id: Revision,
}

/// Sine and cosine for the last normalized rotation that was evaluated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RotationTrig {
    pub(crate) degrees: f64,
    pub(crate) sin: f64,
    pub(crate) cos: f64,
}

impl Default for RotationTrig {
    fn default() -> Self {
        Self {
            degrees: 0.0,
            sin: 0.0,
            cos: 1.0,
        }
    }
}

/// Lazily created cache record owned by one node.
#[derive(Clone, Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) appearance_id: Revision,
    pub(crate) local_bounds_id: Revision,
    pub(crate) local_transform_id: Revision,
    /// Bumped each time [`GraphState::world_transform`] is recomputed.
    pub(crate) world_transform_id: Revision,

    pub(crate) rotation: RotationTrig,
    pub(crate) local_transform: Cached<Affine, Revision>,
    pub(crate) world_transform: Cached<Affine, WorldTransformKey>,

    pub(crate) local_bounds: Cached<Option<Rect>, Revision>,
    pub(crate) bounds: Cached<Option<Rect>, BoundsKey>,
    pub(crate) world_bounds: Cached<Option<Rect>, WorldBoundsKey>,
}

impl GraphState {
    pub(crate) fn bounds_key(&self) -> BoundsKey {
        BoundsKey {
            local_bounds_id: self.local_bounds_id,
            local_transform_id: self.local_transform_id,
        }
    }

    pub(crate) fn world_bounds_key(&self) -> WorldBoundsKey {
        WorldBoundsKey {
            world_transform_id: self.world_transform_id,
            local_bounds_id: self.local_bounds_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_only_move_forward() {
        let mut rev = Revision::default();
        assert_eq!(rev.get(), 0);
        rev.bump();
        rev.bump();
        assert_eq!(rev.get(), 2);
    }

    #[test]
    fn parent_identity_is_part_of_the_key() {
        let a = NodeId::new(0, 1);
        let b = NodeId::new(1, 1);
        let rev = Revision::default();
        let under_a = WorldTransformKey {
            local_transform_id: rev,
            parent: Some(ParentStamp {
                parent: a,
                world_transform_id: rev,
            }),
        };
        let under_b = WorldTransformKey {
            local_transform_id: rev,
            parent: Some(ParentStamp {
                parent: b,
                world_transform_id: rev,
            }),
        };
        let root = WorldTransformKey {
            local_transform_id: rev,
            parent: None,
        };
        assert_ne!(under_a, under_b, "same revision under a different parent");
        assert_ne!(under_a, root, "root is distinct from any parent at revision 0");
    }
}
