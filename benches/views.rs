#![allow(unused)]
extern crate nanoutils;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nanoutils::{
    importer::{LazyImporter, ModuleRegistry, Namespace},
    mapping::DType,
    view::{MemoryGroup, RecursiveKeysView, SequenceView},
};
use std::{
    hint::black_box,
    sync::{Arc, RwLock},
};

/// Builds a tree `depth` levels deep with `width` groups and `width` datasets per group.
fn build_tree(depth: usize, width: usize) -> MemoryGroup {
    fn fill(group: &MemoryGroup, depth: usize, width: usize, f8: &DType) {
        for i in 0..width {
            group
                .create_dataset(&format!("dset{i}"), [16], f8.clone())
                .unwrap();
            if depth > 0 {
                let child = group.create_group(&format!("group{i}")).unwrap();
                fill(&child, depth - 1, width, f8);
            }
        }
    }

    let f8 = DType::parse("f8").unwrap();
    let root = MemoryGroup::new();
    fill(&root, depth, width, &f8);
    root
}

/// Depth-first traversal of in-memory hierarchies of growing size.
fn bench_recursive_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("recursive_keys");
    for depth in [1, 2, 3] {
        let keys = RecursiveKeysView::new(build_tree(depth, 6));
        let leaves = keys.len().unwrap();
        group.throughput(Throughput::Elements(leaves as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &keys, |b, keys| {
            b.iter(|| black_box(keys.to_vec().unwrap()));
        });
    }
    group.finish();
}

/// Iteration and slicing of a view over shared storage.
fn bench_sequence_view(c: &mut Criterion) {
    let owner = Arc::new(RwLock::new((0..10_000_u64).collect::<Vec<_>>()));
    let view = SequenceView::new(owner);

    c.bench_function("sequence_view_iter", |b| {
        b.iter(|| black_box(view.iter().sum::<u64>()));
    });
    c.bench_function("sequence_view_slice", |b| {
        b.iter(|| black_box(view.slice(Some(100), Some(-100), Some(3)).unwrap()));
    });
}

/// First resolution against cached lookups on the namespace.
fn bench_lazy_import(c: &mut Criterion) {
    let registry = Arc::new(ModuleRegistry::new());
    registry.insert(Namespace::new("math").with_attr("tau", 6.25_f64));
    let pkg = registry.insert(Namespace::new("pkg"));
    let importer = LazyImporter::new_in(registry, pkg.clone(), [("tau", "math")]);

    c.bench_function("lazy_resolve", |b| {
        b.iter(|| black_box(importer.resolve("tau").unwrap()));
    });
    importer.resolve("tau").unwrap();
    c.bench_function("lazy_getattr_cached", |b| {
        b.iter(|| black_box(importer.getattr("tau").unwrap()));
    });
}

criterion_group!(
    benches,
    bench_recursive_keys,
    bench_sequence_view,
    bench_lazy_import
);
criterion_main!(benches);
