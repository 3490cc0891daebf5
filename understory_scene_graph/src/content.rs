// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content measurement hook.

use kurbo::Rect;

/// Something drawn by a node, measured in the node's own (untransformed) space.
///
/// The scene graph only needs the axis-aligned extent of the content. When the content
/// changes size in place (for example text being edited), call
/// [`SceneGraph::invalidate_local_bounds`](crate::SceneGraph::invalidate_local_bounds)
/// so the next bounds read measures again.
pub trait Content: core::fmt::Debug {
    /// Local bounds of the content, or `None` if it has no extent.
    fn measure(&self) -> Option<Rect>;
}

/// Fixed-size content.
impl Content for Rect {
    fn measure(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl Content for Option<Rect> {
    fn measure(&self) -> Option<Rect> {
        *self
    }
}
