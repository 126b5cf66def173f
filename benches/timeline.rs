//! Benchmarks for timeline interpolation and background stepping
//!
//! Run with: cargo bench --bench timeline

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use gif_typer::{
    animation::{generate_steps, Timeline},
    backgrounds::{BackgroundKind, BackgroundState},
    config::Config,
};

fn bench_interpolation(c: &mut Criterion) {
    let config = Config::default();
    let timeline = Timeline::new(generate_steps(&config), config.speed);
    let total = timeline.total_ms();

    let mut group = c.benchmark_group("timeline/at_ms");
    for fraction in [0.0, 0.5, 1.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(fraction),
            &(total * fraction),
            |b, &ms| b.iter(|| timeline.at_ms(black_box(ms))),
        );
    }
    group.finish();

    c.bench_function("timeline/full_export_sweep", |b| {
        let frames = timeline.frame_count(12.0);
        b.iter(|| {
            for frame in 0..frames {
                black_box(timeline.at_frame(frame, 12));
            }
        })
    });
}

fn bench_background_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("backgrounds/step");
    for kind in BackgroundKind::ALL {
        group.bench_function(kind.name(), |b| {
            let mut state = BackgroundState::new(kind, 600, 200, Some(1));
            b.iter(|| state.step(600, 200))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_interpolation, bench_background_step);
criterion_main!(benches);
