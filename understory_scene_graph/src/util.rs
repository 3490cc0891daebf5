// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small geometry helpers shared by the bounds and hit-testing code.

use kurbo::{Affine, Point, Rect};

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in the target space.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let p0 = affine * Point::new(rect.x0, rect.y0);
    let p1 = affine * Point::new(rect.x1, rect.y0);
    let p2 = affine * Point::new(rect.x0, rect.y1);
    let p3 = affine * Point::new(rect.x1, rect.y1);
    let min_x = p0.x.min(p1.x).min(p2.x).min(p3.x);
    let min_y = p0.y.min(p1.y).min(p2.y).min(p3.y);
    let max_x = p0.x.max(p1.x).max(p2.x).max(p3.x);
    let max_y = p0.y.max(p1.y).max(p2.y).max(p3.y);
    Rect::new(min_x, min_y, max_x, max_y)
}

/// Union of two optional rects; `None` is the identity.
pub(crate) fn union_opt(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Inverse of `affine`, or `None` if it is singular.
pub(crate) fn invert(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(affine.inverse())
}
