//! Training engine implementation
//!
//! Every enabled variant fits on its own worker thread against an owned copy
//! of the training matrix. Results come back over a channel. A variant whose
//! worker fails or outlives the timeout is recorded as failed while the rest
//! of the batch carries on. A timed-out worker is detached, not killed.

use super::config::{ModelVariant, TrainingConfig};
use super::models::{TrainedArtifact, TrainedModel};
use super::registry::{VariantRegistry, VariantTrainer};
use crate::error::{Result, SurvivalError};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of training one variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VariantOutcome {
    Trained(TrainedArtifact),
    Failed { variant: ModelVariant, reason: String },
}

impl VariantOutcome {
    pub fn variant(&self) -> ModelVariant {
        match self {
            VariantOutcome::Trained(artifact) => artifact.variant,
            VariantOutcome::Failed { variant, .. } => *variant,
        }
    }

    pub fn artifact(&self) -> Option<&TrainedArtifact> {
        match self {
            VariantOutcome::Trained(artifact) => Some(artifact),
            VariantOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VariantOutcome::Failed { .. })
    }

    /// Failure as a recoverable training error
    pub fn error(&self) -> Option<SurvivalError> {
        match self {
            VariantOutcome::Failed { variant, reason } => Some(SurvivalError::Training {
                variant: variant.to_string(),
                reason: reason.clone(),
            }),
            VariantOutcome::Trained(_) => None,
        }
    }
}

/// Outcomes of one training batch, in canonical variant order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingBatch {
    pub outcomes: Vec<VariantOutcome>,
    pub wall_time_secs: f64,
}

impl TrainingBatch {
    pub fn artifacts(&self) -> impl Iterator<Item = &TrainedArtifact> {
        self.outcomes.iter().filter_map(VariantOutcome::artifact)
    }

    /// Failed variants with their reasons
    pub fn failures(&self) -> impl Iterator<Item = (ModelVariant, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            VariantOutcome::Failed { variant, reason } => Some((*variant, reason.as_str())),
            VariantOutcome::Trained(_) => None,
        })
    }

    pub fn get(&self, variant: ModelVariant) -> Option<&VariantOutcome> {
        self.outcomes.iter().find(|o| o.variant() == variant)
    }

    /// Tag every trained artifact with the fitted parameters it was trained under
    pub fn bind_parameters(&mut self, fingerprint: &str) {
        for outcome in &mut self.outcomes {
            if let VariantOutcome::Trained(artifact) = outcome {
                artifact.params_fingerprint = Some(fingerprint.to_string());
            }
        }
    }

    pub fn n_trained(&self) -> usize {
        self.artifacts().count()
    }

    pub fn n_failed(&self) -> usize {
        self.failures().count()
    }
}

type WorkerResult = (ModelVariant, Result<(TrainedModel, f64)>);

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    registry: VariantRegistry,
    parallel: bool,
    timeout: Option<Duration>,
}

impl TrainEngine {
    /// Create an engine whose registry is built from `config`
    pub fn new(config: &TrainingConfig) -> Self {
        Self::with_registry(VariantRegistry::from_config(config), config)
    }

    /// Create an engine over an explicit registry
    pub fn with_registry(registry: VariantRegistry, config: &TrainingConfig) -> Self {
        Self {
            registry,
            parallel: config.parallel,
            timeout: config.timeout(),
        }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Train every registered variant on the same matrix.
    ///
    /// Only malformed input fails the whole call; per-variant failures are
    /// reported as [`VariantOutcome::Failed`].
    pub fn train_all(&self, x: &Array2<f64>, y: &Array1<f64>, feature_names: &[String]) -> Result<TrainingBatch> {
        if x.nrows() != y.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("{} named features", feature_names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        if self.registry.is_empty() {
            return Err(SurvivalError::Config("no model variants registered".to_string()));
        }

        let start = Instant::now();
        info!(
            variants = ?self.registry.variants(),
            n_samples = x.nrows(),
            parallel = self.parallel,
            "training batch started"
        );

        let results = if self.parallel {
            self.run_parallel(x, y)
        } else {
            self.run_sequential(x, y)
        };

        let outcomes: Vec<VariantOutcome> = results
            .into_iter()
            .map(|(variant, result)| match result {
                Ok((model, secs)) => {
                    info!(%variant, training_time_secs = secs, "variant trained");
                    VariantOutcome::Trained(TrainedArtifact::new(model, feature_names.to_vec(), x.nrows(), secs))
                }
                Err(e) => {
                    warn!(%variant, error = %e, "variant failed");
                    let reason = match e {
                        SurvivalError::Training { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    VariantOutcome::Failed { variant, reason }
                }
            })
            .collect();

        let batch = TrainingBatch {
            outcomes,
            wall_time_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            trained = batch.n_trained(),
            failed = batch.n_failed(),
            wall_time_secs = batch.wall_time_secs,
            "training batch finished"
        );
        Ok(batch)
    }

    /// All workers share one deadline
    fn run_parallel(&self, x: &Array2<f64>, y: &Array1<f64>) -> BTreeMap<ModelVariant, Result<(TrainedModel, f64)>> {
        let deadline = deadline_after(self.timeout);
        let (tx, rx) = channel::unbounded();
        let mut results = BTreeMap::new();
        let mut pending = Vec::new();

        for variant in self.registry.variants() {
            if let Some(trainer) = self.registry.get(variant) {
                match spawn_worker(trainer, x, y, tx.clone()) {
                    Ok(()) => pending.push(variant),
                    Err(e) => {
                        results.insert(variant, Err(e));
                    }
                }
            }
        }
        drop(tx);

        while !pending.is_empty() {
            match receive(&rx, deadline) {
                Ok((variant, result)) => {
                    pending.retain(|v| *v != variant);
                    results.insert(variant, result);
                }
                Err(reason) => {
                    for variant in pending.drain(..) {
                        results.insert(variant, Err(failure(variant, reason.clone())));
                    }
                }
            }
        }

        results
    }

    /// One worker at a time, each with its own deadline
    fn run_sequential(&self, x: &Array2<f64>, y: &Array1<f64>) -> BTreeMap<ModelVariant, Result<(TrainedModel, f64)>> {
        let mut results = BTreeMap::new();

        for variant in self.registry.variants() {
            let Some(trainer) = self.registry.get(variant) else {
                continue;
            };
            let (tx, rx) = channel::unbounded();
            let result = match spawn_worker(trainer, x, y, tx) {
                Ok(()) => {
                    let deadline = deadline_after(self.timeout);
                    match receive(&rx, deadline) {
                        Ok((_, result)) => result,
                        Err(reason) => Err(failure(variant, reason)),
                    }
                }
                Err(e) => Err(e),
            };
            results.insert(variant, result);
        }

        results
    }
}

/// Deadline `timeout` from now. A timeout past the clock's range means no deadline.
fn deadline_after(timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| Instant::now().checked_add(t))
}

fn failure(variant: ModelVariant, reason: String) -> SurvivalError {
    SurvivalError::Training {
        variant: variant.to_string(),
        reason,
    }
}

fn spawn_worker(
    trainer: Arc<dyn VariantTrainer>,
    x: &Array2<f64>,
    y: &Array1<f64>,
    tx: Sender<WorkerResult>,
) -> Result<()> {
    let variant = trainer.variant();
    let x = x.to_owned();
    let y = y.to_owned();

    thread::Builder::new()
        .name(format!("train-{}", variant))
        .spawn(move || {
            let start = Instant::now();
            let result = trainer
                .train(&x, &y)
                .map(|model| (model, start.elapsed().as_secs_f64()));
            // The receiver is gone once the engine stopped waiting
            let _ = tx.send((variant, result));
        })
        .map(|_| ())
        .map_err(|e| failure(variant, format!("failed to spawn worker: {}", e)))
}

fn receive(rx: &Receiver<WorkerResult>, deadline: Option<Instant>) -> std::result::Result<WorkerResult, String> {
    match deadline {
        Some(deadline) => {
            rx.recv_deadline(deadline).map_err(|e| match e {
                RecvTimeoutError::Timeout => "training timed out".to_string(),
                RecvTimeoutError::Disconnected => "worker terminated without a result".to_string(),
            })
        }
        None => rx
            .recv()
            .map_err(|_| "worker terminated without a result".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::gradient_boosting::GradientBoostingConfig;
    use crate::training::random_forest::ForestConfig;

    fn make_data() -> (Array2<f64>, Array1<f64>, Vec<String>) {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| (i as f64) * 0.5 + (j as f64) * ((i % 3) as f64));
        let y: Array1<f64> = (0..60).map(|i| if i >= 30 { 1.0 } else { 0.0 }).collect();
        (x, y, vec!["a".to_string(), "b".to_string()])
    }

    fn fast_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_forest(ForestConfig {
                n_estimators: 10,
                ..Default::default()
            })
            .with_boosted(GradientBoostingConfig {
                n_estimators: 10,
                ..Default::default()
            })
    }

    struct PanickingTrainer;

    impl VariantTrainer for PanickingTrainer {
        fn variant(&self) -> ModelVariant {
            ModelVariant::Forest
        }

        fn train(&self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<TrainedModel> {
            panic!("boom");
        }
    }

    #[test]
    fn test_train_all_variants() {
        let (x, y, names) = make_data();
        for parallel in [true, false] {
            let engine = TrainEngine::new(&fast_config().with_parallel(parallel));
            let batch = engine.train_all(&x, &y, &names).unwrap();
            let order: Vec<_> = batch.outcomes.iter().map(VariantOutcome::variant).collect();
            assert_eq!(order, ModelVariant::ALL.to_vec());
            assert_eq!(batch.n_trained(), 3, "failures: {:?}", batch.failures().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let (x, y, names) = make_data();
        let mut config = fast_config();
        config.boosted.learning_rate = f64::INFINITY;
        let batch = TrainEngine::new(&config).train_all(&x, &y, &names).unwrap();

        assert_eq!(batch.n_trained(), 2);
        let failed: Vec<_> = batch.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, ModelVariant::Boosted);
        assert!(failed[0].1.contains("Convergence"), "{}", failed[0].1);
    }

    #[test]
    fn test_panicking_worker_is_failed() {
        let (x, y, names) = make_data();
        let config = fast_config();
        let mut registry = VariantRegistry::from_config(&config);
        registry.register(Arc::new(PanickingTrainer));
        let batch = TrainEngine::with_registry(registry, &config).train_all(&x, &y, &names).unwrap();

        assert!(batch.get(ModelVariant::Forest).unwrap().is_failed());
        assert_eq!(batch.n_trained(), 2);
    }

    #[test]
    fn test_huge_timeout_means_no_deadline() {
        let (x, y, names) = make_data();
        for parallel in [true, false] {
            let config = fast_config()
                .with_parallel(parallel)
                .with_timeout(Duration::from_secs(u64::MAX / 2));
            assert!(config.validate().is_ok());
            let batch = TrainEngine::new(&config).train_all(&x, &y, &names).unwrap();
            assert_eq!(batch.n_trained(), 3);
        }
        assert!(deadline_after(Some(Duration::MAX)).is_none());
        assert!(deadline_after(Some(Duration::from_secs(1))).is_some());
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let (x, _, names) = make_data();
        let engine = TrainEngine::new(&fast_config());
        assert!(engine.train_all(&x, &Array1::zeros(3), &names).is_err());
        assert!(engine.train_all(&x, &Array1::zeros(60), &names[..1]).is_err());
    }
}
