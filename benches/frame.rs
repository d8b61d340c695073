//! Benchmarks for the per-frame CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ringfx::prelude::*;

const PRESETS: &[&str] = &["Soma", "embers-03", "electric-04", "meteor-shower-06", "plasma-current-07"];

fn engine(name: &str) -> ParticleEngine {
    ParticleEngine::new(
        EngineConfig::new(name)
            .with_seed(11)
            .with_breath(BreathPattern::default()),
    )
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for &name in PRESETS {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            let mut engine = engine(name);
            b.iter(|| {
                engine.step(black_box(1.0 / 60.0));
            })
        });
    }

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_display_list");

    for &name in PRESETS {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            let mut engine = engine(name);
            let mut canvas = DisplayList::new(300, 300);
            for _ in 0..30 {
                engine.step(1.0 / 60.0);
            }
            b.iter(|| {
                engine.draw(&mut canvas);
                black_box(canvas.take().len())
            })
        });
    }

    group.finish();
}

fn bench_raster(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_raster");
    group.sample_size(20);

    for &name in PRESETS {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            let mut engine = engine(name);
            let mut canvas = RasterCanvas::new(300, 300);
            let mut timestamp = 0.0;
            b.iter(|| {
                timestamp += 1000.0 / 60.0;
                engine.frame(black_box(timestamp), &mut canvas)
            })
        });
    }

    group.finish();
}

fn bench_color_transform(c: &mut Criterion) {
    let preset = registry::preset_by_id("embers-03").map(|p| p.color_modifier);
    let transform = ColorTransform::new(preset.unwrap_or_default(), false);
    let accent = Rgb::GOLD;

    c.bench_function("color_transform", |b| {
        b.iter(|| transform.apply(black_box(accent), black_box(0.7), black_box(0.1), black_box(12.0)))
    });
}

criterion_group!(benches, bench_step, bench_record, bench_raster, bench_color_transform);
criterion_main!(benches);
