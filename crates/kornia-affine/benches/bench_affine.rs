use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kornia_affine::{
    affine_from_points, ransac_affine, ransac_affine_par, AffineMatrix, Correspondence,
    RansacParams,
};

/// Generate correspondences following an affine transform, every fifth one an outlier.
fn generate_affine_data(n: usize) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let h_true = AffineMatrix::from_linear_translation([[0.87, -0.5], [0.5, 0.87]], [2.0, 3.0]);
    let side = (n as f64).sqrt().ceil() as usize;
    let mut x1 = Vec::with_capacity(n);
    let mut x2 = Vec::with_capacity(n);
    for i in 0..n {
        let p = [(i % side * 4) as f64, (i / side * 3 + i % 3) as f64];
        let mut q = h_true.transform_point(&p);
        if i % 5 == 0 {
            q[0] += 40.0;
            q[1] -= 25.0;
        }
        x1.push(p);
        x2.push(q);
    }
    (x1, x2)
}

fn bench_affine_from_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("affine_from_points");
    for &n in &[3, 50, 500] {
        let (x1, x2) = generate_affine_data(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(affine_from_points(&x1, &x2));
            });
        });
    }
    group.finish();
}

fn bench_ransac_affine(c: &mut Criterion) {
    let mut group = c.benchmark_group("ransac_affine");
    let params = RansacParams {
        iterations: 200,
        error_threshold: 1.0,
        min_consensus: 10,
        random_seed: Some(0),
        ..Default::default()
    };
    for &n in &[50, 500, 2000] {
        let (x1, x2) = generate_affine_data(n);
        let corrs = x1
            .iter()
            .zip(x2.iter())
            .map(|(p, q)| Correspondence::new(*p, *q))
            .collect::<Vec<_>>();

        group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(ransac_affine(&corrs, &params));
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(ransac_affine_par(&corrs, &params, None));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_affine_from_points, bench_ransac_affine);
criterion_main!(benches);
