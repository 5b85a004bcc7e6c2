// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use understory_hierarchy::{HierarchyMapper, TreeData};

/// Builds a tree with `fanout` children per node, `depth` levels deep.
///
/// Returns the data and every node that has children.
fn build_tree(fanout: u32, depth: u32) -> (TreeData<u32>, Vec<u32>) {
    let mut data = TreeData::new();
    let mut next = 0_u32;
    let mut level: Vec<Option<u32>> = vec![None];
    let mut parents = Vec::new();
    for _ in 0..depth {
        let mut below = Vec::new();
        for parent in level {
            if let Some(parent) = parent {
                parents.push(parent);
            }
            for _ in 0..fanout {
                data.add_item(parent.as_ref(), next).unwrap();
                below.push(Some(next));
                next += 1;
            }
        }
        level = below;
    }
    (data, parents)
}

fn bench_tree_size_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/tree_size_cold");
    group.sample_size(20);

    // Fully expanded: every group is read from the source once.
    for fanout in [8_u32, 16, 32] {
        let (data, parents) = build_tree(fanout, 3);
        group.throughput(Throughput::Elements(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fanout), &data, |b, data| {
            b.iter_batched(
                || HierarchyMapper::new(data).with_expanded(parents.iter().copied()),
                |mut mapper| black_box(mapper.tree_size().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_positional_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/queries");

    let (data, parents) = build_tree(32, 3);
    let mut mapper = HierarchyMapper::new(&data).with_expanded(parents.iter().copied());
    let len = mapper.tree_size().unwrap();
    let last = mapper.node_at(len - 1).unwrap();

    group.bench_function("index_of_last", |b| {
        b.iter(|| black_box(mapper.index_of(black_box(&last)).unwrap()));
    });

    group.bench_function("node_at_middle", |b| {
        b.iter(|| black_box(mapper.node_at(black_box(len / 2)).unwrap()));
    });

    // A viewport worth of rows.
    for window in [50_usize, 500] {
        group.throughput(Throughput::Elements(window as u64));
        group.bench_with_input(BenchmarkId::new("fetch", window), &window, |b, &window| {
            let start = len / 2;
            b.iter(|| {
                let sum: u64 = mapper
                    .fetch(start..start + window)
                    .unwrap()
                    .map(|&n| u64::from(n))
                    .sum();
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_expand_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/toggle");

    let (data, parents) = build_tree(32, 3);
    let mut mapper = HierarchyMapper::new(&data).with_expanded(parents.iter().copied());
    mapper.tree_size().unwrap();
    // A deep parent near the end, so every level of the path is updated.
    let target = parents[parents.len() - 1];
    let at = mapper.index_of(&target).unwrap();

    group.bench_function("collapse_expand", |b| {
        b.iter(|| {
            black_box(mapper.collapse(&target, at).unwrap());
            black_box(mapper.expand(&target, at).unwrap());
        });
    });

    group.bench_function("expand_node_after_refresh", |b| {
        b.iter(|| {
            mapper.collapse_node(&target).unwrap();
            mapper.refresh_children(Some(&target)).unwrap();
            black_box(mapper.expand_node(&target).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tree_size_cold,
    bench_positional_queries,
    bench_expand_collapse
);
criterion_main!(benches);
