// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, kinds, flags and geometry.

/// Identifier for a node in a [`SceneGraph`](crate::SceneGraph).
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the node is destroyed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On [`destroy`](crate::SceneGraph::destroy), the slot is freed; any existing `NodeId`
///   that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Stale `NodeId`s never alias a different live node because the generation must match.
/// This is also what makes a parent identity safe to record in a cache stamp:
/// a reused slot can never satisfy a stamp taken against its previous occupant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Whether a node may hold children.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// A node with an ordered child list.
    #[default]
    Container,
    /// A node that only carries its own content.
    Leaf,
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (participates in picking; an invisible container hides its subtree).
        const VISIBLE  = 0b0000_0001;
        /// Node is pickable (may be returned by [`pick`](crate::SceneGraph::pick)).
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// Geometry properties a node's local transform is derived from.
///
/// Rotation is in degrees and is kept normalized into `(-180, 180]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Horizontal translation in parent space.
    pub x: f64,
    /// Vertical translation in parent space.
    pub y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
}

impl Geometry {
    /// Bitwise equality of every field.
    pub(crate) fn same_bits(&self, other: &Self) -> bool {
        let bits = |g: &Self| {
            [g.x, g.y, g.rotation, g.scale_x, g.scale_y].map(f64::to_bits)
        };
        bits(self) == bits(other)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}
