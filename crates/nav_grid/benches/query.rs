mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use nav_grid::grid::{GraphId, GridConfig};
use nav_grid::probe::{FnProbe, ProbeSample};
use nav_grid::uniform::{GridGraph, NearestConstraint};

fn sparse_probe() -> FnProbe<impl Fn(Vec3) -> ProbeSample + Send + Sync> {
    FnProbe::new(|p: Vec3| {
        // Walkable islands every 32 units; everything else blocked, forcing
        // the constrained search to walk several rings.
        let island = (p.x.rem_euclid(32.0) < 4.0) && (p.z.rem_euclid(32.0) < 4.0);
        if island {
            ProbeSample::walkable_at(Vec3::new(p.x, 0.0, p.z))
        } else {
            ProbeSample::blocked_at(Vec3::new(p.x, 0.0, p.z))
        }
    })
}

fn nearest_benches(c: &mut Criterion) {
    let graph = GridGraph::build(
        GraphId(0),
        GridConfig::new(Vec2::new(512.0, 512.0)),
        &sparse_probe(),
    )
    .unwrap();

    let mut group = c.benchmark_group("query/nearest");
    group.throughput(common::elements_throughput(1));
    group.bench_function("unconstrained", |b| {
        b.iter(|| {
            let hit = graph.nearest(black_box(Vec3::new(13.0, 0.0, -117.0)));
            black_box(hit);
        });
    });

    for &offset in &[1.0f32, 10.0, 30.0] {
        group.bench_with_input(
            BenchmarkId::new("constrained", offset as u32),
            &offset,
            |b, &offset| {
                let constraint = NearestConstraint::default();
                b.iter(|| {
                    let hit = graph.nearest_where(
                        black_box(Vec3::new(offset, 0.0, offset)),
                        &constraint,
                        |n| n.walkable,
                    );
                    black_box(hit);
                });
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = benches_group;
    config = common::default_criterion();
    targets = nearest_benches
}
criterion_main!(benches_group);
