use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use digitize::{chord_sample, ChordParams, Interp1d};

/// A wandering track of `n` traces about 1 m apart, with a 500 m gap
/// in the middle.
fn track(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(n);
    let mut easting = Vec::with_capacity(n);
    let mut northing = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64;
        let gap = if i >= n / 2 { 500.0 } else { 0.0 };
        x.push(t);
        easting.push(500_000.0 + t + gap);
        northing.push(8_700_000.0 + (t / 50.0).sin() * 20.0);
    }
    (x, easting, northing)
}

fn chord_resampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Chord Sample");
    let params = ChordParams::default();

    for n in [1_000, 10_000, 60_000] {
        let (x, easting, northing) = track(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| chord_sample(&x, &easting, &northing, &params).unwrap())
        });
    }
}

fn nearest_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Nearest Lookup");

    for n in [1_000, 10_000, 60_000] {
        let xs: Vec<f64> = (0..n).map(|i| i as f64 * 2.0).collect();
        let model = Interp1d::nearest(&xs, &xs).unwrap();
        let queries: Vec<f64> = (0..n).map(|i| i as f64 * 1.999).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| queries.iter().map(|&x| model.eval(x)).sum::<f64>())
        });
    }
}

criterion_group!(benches, chord_resampling, nearest_lookup);
criterion_main!(benches);
