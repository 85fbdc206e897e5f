use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use titanic_survival::prelude::*;
use titanic_survival::training::{ForestConfig, GradientBoostingConfig};

fn create_manifest(n: usize) -> Vec<PassengerRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let titles = ["Mr", "Mrs", "Miss", "Master", "Rev"];

    (0..n)
        .map(|i| {
            let pclass: u8 = rng.gen_range(1..=3);
            let female = rng.gen_bool(0.35);
            let title = titles[rng.gen_range(0..titles.len())];
            let sex = if female { Sex::Female } else { Sex::Male };
            let survived = rng.gen_bool(if female { 0.7 } else { 0.2 });

            let mut record = PassengerRecord::new(i as u32 + 1, pclass, format!("Surname{}, {}. Given", i, title), sex)
                .with_family(rng.gen_range(0..3), rng.gen_range(0..3))
                .with_fare(rng.gen_range(5.0..200.0) / pclass as f64)
                .with_embarked([Port::S, Port::C, Port::Q][rng.gen_range(0..3)])
                .with_survived(survived);
            if rng.gen_bool(0.8) {
                record = record.with_age(rng.gen_range(1.0..75.0));
            }
            record
        })
        .collect()
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    for n in [500, 5000].iter() {
        let records = create_manifest(*n);
        let transformer = FeatureTransformer::new(FeatureConfig::default());

        group.bench_with_input(BenchmarkId::new("fit", n), &records, |b, records| {
            b.iter(|| transformer.fit(black_box(records)).unwrap())
        });

        let params = transformer.fit(&records).unwrap();
        group.bench_with_input(BenchmarkId::new("apply", n), &records, |b, records| {
            b.iter(|| transformer.apply_all(black_box(records), &params).unwrap())
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10); // Fewer samples for training benchmarks

    let training = TrainingConfig::default()
        .with_forest(ForestConfig {
            n_estimators: 50,
            ..Default::default()
        })
        .with_boosted(GradientBoostingConfig {
            n_estimators: 50,
            ..Default::default()
        });
    let records = create_manifest(800);

    for parallel in [true, false] {
        let config = PipelineConfig::default().with_training(training.clone().with_parallel(parallel));
        let pipeline = SurvivalPipeline::new(config);
        let label = if parallel { "parallel" } else { "sequential" };

        group.bench_with_input(BenchmarkId::new("run", label), &records, |b, records| {
            b.iter(|| pipeline.run(black_box(records)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_features, bench_pipeline);
criterion_main!(benches);
