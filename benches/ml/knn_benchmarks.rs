use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use knn::{KNNClassifier, KNNConfig, Metric, Weighting};
use rand::Rng;

const DIMS: usize = 8;

fn random_points(n: usize) -> Vec<Vec<f64>> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| (0..DIMS).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect()
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_predict");
    let queries = random_points(64);

    for &size in &[100usize, 1_000, 5_000] {
        let features = random_points(size);
        let labels: Vec<u8> = (0..size).map(|i| (i % 3) as u8).collect();

        for metric in [Metric::Euclidean, Metric::Minkowski(3)] {
            let config = KNNConfig::new(5)
                .with_metric(metric)
                .with_weighting(Weighting::Distance);
            let mut knn = KNNClassifier::new(config).unwrap();
            knn.fit(&features, &labels).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("serial/{}", metric), size),
                &queries,
                |b, q| b.iter(|| knn.predict(black_box(q)).unwrap()),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("parallel/{}", metric), size),
                &queries,
                |b, q| b.iter(|| knn.predict_par(black_box(q)).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
