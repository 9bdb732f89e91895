#![deny(warnings)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tessellate::*;

/// Flower like shape with many curves and self intersections
fn flower(petals: usize, radius: Scalar) -> Path {
    let mut builder = Path::builder();
    builder.move_to((radius, 0.0));
    let step = 2.0 * PI / petals as Scalar;
    for index in 0..petals {
        let a0 = index as Scalar * step;
        let a1 = a0 + step;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        builder.bezier_to(
            (2.0 * radius * c0, 2.0 * radius * s0),
            (2.0 * radius * c1, 2.0 * radius * s1),
            (radius * c1, radius * s1),
        );
    }
    builder.close().build()
}

fn shapes() -> Vec<(&'static str, Path)> {
    vec![
        (
            "rounded rect",
            Path::builder()
                .rounded_rect(10.0, 10.0, 300.0, 200.0, 20.0)
                .build(),
        ),
        (
            "circles",
            Path::builder()
                .circle((100.0, 100.0), 80.0)
                .circle((160.0, 100.0), 80.0)
                .build(),
        ),
        ("flower", flower(64, 200.0)),
    ]
}

fn flatten_benchmark(c: &mut Criterion) {
    let config = TessellationConfig::default();
    let tr = Transform::identity().translate(250.0, 250.0);
    let mut cache = PathCache::new();
    let mut group = c.benchmark_group("flatten");
    for (name, path) in shapes() {
        group
            .throughput(Throughput::Elements(path.commands().len() as u64))
            .bench_with_input(BenchmarkId::from_parameter(name), &path, |b, path| {
                b.iter(|| cache.flatten(black_box(path), tr, &config))
            });
    }
    group.finish();
}

fn fill_benchmark(c: &mut Criterion) {
    let config = TessellationConfig::default();
    let tr = Transform::identity().translate(250.0, 250.0);
    let mut cache = PathCache::new();
    let mut group = c.benchmark_group("fill");
    for (name, path) in shapes() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |b, path| {
            b.iter(|| {
                cache.flatten(black_box(path), tr, &config)?;
                cache.expand_fill_config(&config)
            })
        });
    }
    group.finish();
}

fn stroke_benchmark(c: &mut Criterion) {
    let config = TessellationConfig::default();
    let tr = Transform::identity().translate(250.0, 250.0);
    let mut cache = PathCache::new();
    let mut group = c.benchmark_group("stroke");
    for join in [LineJoin::Miter, LineJoin::Bevel, LineJoin::Round] {
        let style = StrokeStyle {
            width: 5.0,
            line_join: join,
            line_cap: LineCap::Round,
            ..StrokeStyle::default()
        };
        let path = flower(64, 200.0);
        group.bench_with_input(
            BenchmarkId::new("flower", format!("{:?}", join)),
            &path,
            |b, path| {
                b.iter(|| {
                    cache.flatten(black_box(path), tr, &config)?;
                    cache.expand_stroke_style(&style, &config)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    flatten_benchmark,
    fill_benchmark,
    stroke_benchmark
);
criterion_main!(benches);
