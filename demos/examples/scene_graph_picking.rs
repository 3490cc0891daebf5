// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph picking.
//!
//! Stack overlapping nodes, pick under a pointer, reorder, and pick again.
//!
//! Run:
//! - `cargo run -p understory_demos --example scene_graph_picking`

use kurbo::{Point, Rect};
use tracing::info;
use understory_scene_graph::{NodeFlags, QueryFilter, SceneGraph};

fn main() {
    tracing_subscriber::fmt::init();

    let mut graph = SceneGraph::new();
    let root = graph.create_container();
    let back = graph.create_leaf();
    let front = graph.create_leaf();
    graph.set_content(back, Rect::new(0.0, 0.0, 100.0, 100.0));
    graph.set_content(front, Rect::new(0.0, 0.0, 60.0, 60.0));
    graph.set_position(front, 40.0, 40.0);
    graph.add_child(root, back).unwrap();
    graph.add_child(root, front).unwrap();

    let filter = QueryFilter {
        visible_only: true,
        pickable_only: true,
    };
    let pointer = Point::new(50.0, 50.0);

    let hit = graph.pick(root, pointer, filter).unwrap();
    info!(node = ?hit.node, path = ?hit.path, "topmost");
    assert_eq!(hit.node, front, "the last child is on top");

    graph.swap_children(root, back, front).unwrap();
    let hit = graph.pick(root, pointer, filter).unwrap();
    info!(node = ?hit.node, "after swapping");
    assert_eq!(hit.node, back);

    graph.set_flags(back, NodeFlags::VISIBLE);
    let hit = graph.pick(root, pointer, filter).unwrap();
    info!(node = ?hit.node, "with the back node unpickable");
    assert_eq!(hit.node, front);

    // A rotated node: the bounds test is conservative, the shape test is exact.
    graph.set_rotation(front, 45.0);
    let corner = Point::new(41.0, 41.0);
    let by_bounds = graph.hit_test_point(front, corner, false);
    let by_shape = graph.hit_test_point(front, corner, true);
    info!(by_bounds, by_shape, "rotated hit test");
    let overlap = graph.hit_test_object(back, front);
    info!(overlap, "back and front overlap");
    match graph.global_to_local(front, pointer) {
        Ok(local) => info!(?local, "pointer in front's space"),
        Err(err) => info!(%err, "cannot map pointer"),
    }
}
