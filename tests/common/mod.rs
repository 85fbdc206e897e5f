//! Shared fixtures for integration tests

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use titanic_survival::prelude::*;
use titanic_survival::training::{ForestConfig, GradientBoostingConfig};

/// Synthetic labeled manifest with realistic gaps (missing ages, fares,
/// ports and cabins) and survival driven by sex and class.
pub fn manifest(n: usize) -> Vec<PassengerRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let ports = [Port::S, Port::S, Port::S, Port::C, Port::Q];

    (0..n)
        .map(|i| {
            let pclass: u8 = rng.gen_range(1..=3);
            let female = rng.gen_bool(0.35);
            let age: f64 = rng.gen_range(1.0..75.0);
            let title = if female {
                if age < 18.0 || rng.gen_bool(0.4) {
                    "Miss"
                } else {
                    "Mrs"
                }
            } else if age < 14.0 {
                "Master"
            } else if rng.gen_bool(0.03) {
                "Dr"
            } else {
                "Mr"
            };
            let name = format!("Family{}, {}. Given{}", i % 97, title, i);
            let sex = if female { Sex::Female } else { Sex::Male };
            let fare = match pclass {
                1 => rng.gen_range(30.0..250.0),
                2 => rng.gen_range(10.0..40.0),
                _ => rng.gen_range(5.0..20.0),
            };
            let sibsp = rng.gen_range(0..3);
            let parch = rng.gen_range(0..3);

            let mut p_survive: f64 = if female { 0.75 } else { 0.2 };
            p_survive += match pclass {
                1 => 0.15,
                2 => 0.0,
                _ => -0.1,
            };
            let survived = rng.gen_bool(p_survive.clamp(0.05, 0.95));

            let mut record = PassengerRecord::new(i as u32 + 1, pclass, name, sex)
                .with_family(sibsp, parch)
                .with_survived(survived);
            if rng.gen_bool(0.8) {
                record = record.with_age((age * 10.0).round() / 10.0);
            }
            if rng.gen_bool(0.97) {
                record = record.with_fare((fare * 100.0_f64).round() / 100.0);
            }
            if pclass == 1 && rng.gen_bool(0.7) {
                record = record.with_cabin(format!("C{}", i));
            }
            if rng.gen_bool(0.98) {
                record = record.with_embarked(ports[rng.gen_range(0..ports.len())]);
            }
            record
        })
        .collect()
}

/// Default configuration with smaller ensembles so tests stay quick
pub fn fast_config() -> PipelineConfig {
    let training = TrainingConfig::default()
        .with_forest(ForestConfig {
            n_estimators: 25,
            ..Default::default()
        })
        .with_boosted(GradientBoostingConfig {
            n_estimators: 25,
            ..Default::default()
        });
    PipelineConfig::default().with_training(training)
}
