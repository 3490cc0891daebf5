// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph basics.
//!
//! Build a small graph, move a group, and watch which caches are recomputed.
//!
//! Run:
//! - `cargo run -p understory_demos --example scene_graph_basics`

use kurbo::Rect;
use tracing::{Level, info};
use understory_scene_graph::SceneGraph;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .init();

    let mut graph = SceneGraph::new();
    let stage = graph.create_container();
    let group = graph.create_container();
    graph.add_child(stage, group).unwrap();

    let mut cards = Vec::new();
    for i in 0..3 {
        let card = graph.create_leaf();
        graph.set_content(card, Rect::new(0.0, 0.0, 40.0, 24.0));
        graph.set_position(card, i as f64 * 50.0, 0.0);
        graph.add_child(group, card).unwrap();
        cards.push(card);
    }

    let bounds = graph.world_bounds_rect(stage);
    info!(?bounds, "initial stage bounds");
    info!(stats = ?graph.stats(), "first read");

    graph.reset_stats();
    let _ = graph.world_bounds_rect(stage);
    info!(stats = ?graph.stats(), "second read is cached");

    // Moving the group leaves every card's local state alone.
    graph.reset_stats();
    graph.set_position(group, 100.0, 40.0);
    graph.set_rotation(group, 90.0);
    let bounds = graph.world_bounds_rect(stage);
    info!(?bounds, "after moving the group");
    info!(stats = ?graph.stats(), "group move");

    // Only the edited card is re-measured.
    graph.reset_stats();
    graph.set_content(cards[1], Rect::new(0.0, 0.0, 40.0, 80.0));
    let bounds = graph.world_bounds_rect(stage);
    info!(?bounds, "after resizing one card");
    info!(stats = ?graph.stats(), "content change");

    for &card in &cards {
        let world = graph.world_transform(card);
        let in_stage = graph.calculate_bounds_rect(card, stage);
        info!(?card, ?world, ?in_stage, "card");
    }
}
