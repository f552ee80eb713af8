use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mechtherm::config::TensileConfig;
use mechtherm::tensile::{mechanical_properties, TrialCurve};
use mechtherm::thermal::weight_derivative;
use rand::distributions::{Distribution, Uniform};

fn bench_weight_derivative(c: &mut Criterion) {
    c.bench_function("weight derivative on large sweep", |b| {
        let noise = Uniform::new(0.0, 0.05);
        let mut rng = rand::thread_rng();
        let temperature: Vec<f64> = (0..100000).map(|i| 25.0 + 0.006 * i as f64).collect();
        let weight_percent: Vec<f64> = temperature
            .iter()
            .map(|t| 100.0 - 0.15 * (t - 25.0) + noise.sample(&mut rng))
            .collect();

        b.iter(|| {
            let deriv = weight_derivative(black_box(&temperature), black_box(&weight_percent));
            black_box(deriv);
        });
    });
}

fn bench_mechanical_properties(c: &mut Criterion) {
    c.bench_function("mechanical properties on large trial", |b| {
        let noise = Uniform::new(0.0, 0.02);
        let mut rng = rand::thread_rng();
        let rows: Vec<[f64; 3]> = (0..100000)
            .map(|i| {
                let crosshead = 0.0005 * i as f64;
                let load = 3.0 * crosshead + noise.sample(&mut rng);
                [crosshead, load, 0.01 * i as f64]
            })
            .collect();
        let curve = TrialCurve::new(rows, 30.0, 3.0).expect("synthetic trial should build");
        let config = TensileConfig::default();

        b.iter(|| {
            let properties = mechanical_properties(black_box(&curve), black_box(&config));
            black_box(properties);
        });
    });
}

criterion_group!(benches, bench_weight_derivative, bench_mechanical_properties);
criterion_main!(benches);
