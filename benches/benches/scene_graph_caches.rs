// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use understory_scene_graph::{NodeId, QueryFilter, SceneGraph};

/// A single chain of containers ending in a leaf. Returns `(root, leaf)`.
fn build_chain(depth: usize) -> (SceneGraph, NodeId, NodeId) {
    let mut graph = SceneGraph::new();
    let root = graph.create_container();
    let mut parent = root;
    for i in 0..depth {
        let node = graph.create_container();
        graph.set_position(node, 1.0, 0.5);
        graph.set_rotation(node, (i % 7) as f64 * 3.0);
        graph.add_child(parent, node).unwrap();
        parent = node;
    }
    let leaf = graph.create_leaf();
    graph.set_content(leaf, Rect::new(0.0, 0.0, 10.0, 10.0));
    graph.add_child(parent, leaf).unwrap();
    (graph, root, leaf)
}

/// A root with `n * n` leaves laid out on a grid. Returns `(root, leaves)`.
fn build_grid(n: usize, cell: f64) -> (SceneGraph, NodeId, Vec<NodeId>) {
    let mut graph = SceneGraph::new();
    let root = graph.create_container();
    let mut leaves = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let leaf = graph.create_leaf();
            graph.set_content(leaf, Rect::new(0.0, 0.0, cell * 0.8, cell * 0.8));
            graph.set_position(leaf, x as f64 * cell, y as f64 * cell);
            graph.add_child(root, leaf).unwrap();
            leaves.push(leaf);
        }
    }
    (graph, root, leaves)
}

fn bench_world_transform_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_transform_chain");
    for &depth in &[8usize, 64, 256] {
        let (mut graph, root, leaf) = build_chain(depth);
        let _ = graph.world_transform(leaf);

        group.bench_function(format!("cached_depth{}", depth), |b| {
            b.iter(|| black_box(graph.world_transform(leaf)));
        });

        let mut x = 0.0;
        group.bench_function(format!("root_moved_depth{}", depth), |b| {
            b.iter(|| {
                x += 1.0;
                graph.set_x(root, x);
                black_box(graph.world_transform(leaf))
            });
        });
    }
    group.finish();
}

fn bench_world_bounds_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_bounds_grid");
    for &n in &[16usize, 64] {
        let (mut graph, root, leaves) = build_grid(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("cold_n{}", n), |b| {
            b.iter_batched(
                || build_grid(n, 10.0),
                |(mut graph, root, _)| black_box(graph.world_bounds_rect(root)),
                BatchSize::SmallInput,
            );
        });

        let _ = graph.world_bounds_rect(root);
        group.bench_function(format!("cached_n{}", n), |b| {
            b.iter(|| black_box(graph.world_bounds_rect(root)));
        });

        let mover = leaves[leaves.len() / 2];
        let mut x = 0.0;
        group.bench_function(format!("one_leaf_moved_n{}", n), |b| {
            b.iter(|| {
                x += 0.25;
                graph.set_x(mover, x);
                black_box(graph.world_bounds_rect(root))
            });
        });
    }
    group.finish();
}

fn bench_pick_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_grid");
    for &n in &[16usize, 64] {
        let (mut graph, root, _) = build_grid(n, 10.0);
        let _ = graph.world_bounds_rect(root);
        let filter = QueryFilter {
            visible_only: true,
            pickable_only: true,
        };
        let point = Point::new(n as f64 * 5.0 + 1.0, n as f64 * 5.0 + 1.0);
        group.bench_function(format!("pick_n{}", n), |b| {
            b.iter(|| black_box(graph.pick(root, point, filter)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_world_transform_chain,
    bench_world_bounds_grid,
    bench_pick_grid,
);
criterion_main!(benches);
