//! Benchmarks for triangulation, interpolation and the full pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::DMatrix;

use rootstar_topo_core::projection::project_layout;
use rootstar_topo_core::types::SensorPosition;
use rootstar_topo_native::features::BandPowerExtractor;
use rootstar_topo_native::pipeline::{ImageConfig, PipelineContext};
use rootstar_topo_native::processing::interpolate::{Grid, InterpolationPlan};
use rootstar_topo_native::processing::triangulation::Triangulation;

/// Synthetic montage spread over the upper hemisphere
fn montage(n: usize) -> Vec<SensorPosition> {
    (0..n)
        .map(|k| {
            let elev = 0.1 + 1.3 * (k % 5) as f64 / 5.0;
            let az = k as f64 * 2.399_963; // golden angle
            SensorPosition::new(elev.cos() * az.cos(), elev.cos() * az.sin(), elev.sin())
        })
        .collect()
}

/// Smooth pseudo-features, `(n_samples, n_columns)`
fn features(n_samples: usize, n_columns: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n_samples, n_columns, |r, c| {
        ((r * 13 + c * 5) as f64 * 0.211).sin() * 20.0 + 40.0
    })
}

fn bench_triangulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulation");

    for n_sensors in [16, 64, 128].iter() {
        let layout = project_layout(&montage(*n_sensors)).unwrap_or_default();

        group.bench_with_input(
            BenchmarkId::from_parameter(n_sensors),
            n_sensors,
            |b, _| {
                b.iter(|| {
                    let tri = Triangulation::new(black_box(layout.points()));
                    black_box(tri.map(|t| t.triangles().len()))
                });
            },
        );
    }

    group.finish();
}

fn bench_single_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate_grid");

    let layout = project_layout(&montage(64)).unwrap_or_default();
    let Some(bounds) = layout.bounding_box() else {
        return;
    };
    let values: Vec<f64> = (0..layout.len()).map(|k| (k as f64 * 0.7).sin()).collect();

    for n in [16, 32, 64].iter() {
        let Ok(plan) = Grid::new(bounds, *n).and_then(|g| InterpolationPlan::new(layout.points(), g))
        else {
            continue;
        };

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| black_box(plan.interpolate(black_box(&values))));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let positions = montage(64);

    for n_samples in [16, 128].iter() {
        let feats = features(*n_samples, 3 * positions.len());

        for parallel in [false, true] {
            let config = ImageConfig {
                parallel,
                ..ImageConfig::default()
            };
            let Ok(ctx) = PipelineContext::new(&positions, config) else {
                continue;
            };
            let label = if parallel { "parallel" } else { "sequential" };

            group.bench_with_input(BenchmarkId::new(label, n_samples), n_samples, |b, _| {
                b.iter(|| black_box(ctx.generate(black_box(&feats)).map(|o| o.images.shape())));
            });
        }
    }

    group.finish();
}

fn bench_band_powers(c: &mut Criterion) {
    let mut group = c.benchmark_group("band_powers");

    let n_times = 256;
    let trials: Vec<DMatrix<f64>> = (0..32)
        .map(|t| DMatrix::from_fn(64, n_times, |s, i| ((t + s * i) as f64 * 0.05).sin() * 50.0))
        .collect();
    let Ok(mut extractor) = BandPowerExtractor::new(n_times, 128.0) else {
        return;
    };

    group.bench_function("extract_32_trials", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&trials)).map(|f| f.ncols())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_triangulation,
    bench_single_grid,
    bench_pipeline,
    bench_band_powers,
);

criterion_main!(benches);
