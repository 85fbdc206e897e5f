//! Variant trainers and the configuration-driven registry

use super::config::{ModelVariant, TrainingConfig};
use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::linear_models::{LogisticConfig, LogisticRegression};
use super::models::{Model, TrainedModel};
use super::random_forest::{ForestConfig, RandomForest};
use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Uniform train/predict capability shared by every classifier variant
pub trait VariantTrainer: Send + Sync {
    /// Variant this trainer produces
    fn variant(&self) -> ModelVariant;

    /// Fit a fresh model on the given matrix and 0/1 labels
    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel>;

    /// Predict 0/1 labels with a trained model
    fn predict(&self, model: &TrainedModel, x: &Array2<f64>) -> Result<Array1<f64>> {
        model.predict(x)
    }
}

/// Trains [`LogisticRegression`]
#[derive(Debug, Clone, Default)]
pub struct LogisticTrainer {
    pub config: LogisticConfig,
}

impl VariantTrainer for LogisticTrainer {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Logistic
    }

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = LogisticRegression::new(self.config.clone());
        model.fit(x, y)?;
        Ok(TrainedModel::Logistic(model))
    }
}

/// Trains [`RandomForest`]
#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    pub config: ForestConfig,
    pub random_state: Option<u64>,
}

impl VariantTrainer for ForestTrainer {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Forest
    }

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = RandomForest::new(self.config.clone());
        if let Some(seed) = self.random_state {
            model = model.with_random_state(seed);
        }
        model.fit(x, y)?;
        Ok(TrainedModel::Forest(model))
    }
}

/// Trains [`GradientBoostingClassifier`]
#[derive(Debug, Clone, Default)]
pub struct BoostedTrainer {
    pub config: GradientBoostingConfig,
}

impl VariantTrainer for BoostedTrainer {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Boosted
    }

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let mut model = GradientBoostingClassifier::new(self.config.clone());
        model.fit(x, y)?;
        Ok(TrainedModel::Boosted(model))
    }
}

/// Enabled variant trainers, iterated in canonical order
#[derive(Clone, Default)]
pub struct VariantRegistry {
    trainers: BTreeMap<ModelVariant, Arc<dyn VariantTrainer>>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding a trainer for each variant enabled in `config`
    pub fn from_config(config: &TrainingConfig) -> Self {
        let mut registry = Self::new();
        for variant in config.enabled_variants() {
            let trainer: Arc<dyn VariantTrainer> = match variant {
                ModelVariant::Logistic => Arc::new(LogisticTrainer {
                    config: config.logistic.clone(),
                }),
                ModelVariant::Forest => Arc::new(ForestTrainer {
                    config: config.forest.clone(),
                    random_state: config.random_state,
                }),
                ModelVariant::Boosted => {
                    let mut boosted = config.boosted.clone();
                    if config.random_state.is_some() {
                        boosted.random_state = config.random_state;
                    }
                    Arc::new(BoostedTrainer { config: boosted })
                }
            };
            registry.trainers.insert(variant, trainer);
        }
        registry
    }

    /// Add a trainer, replacing any existing one for the same variant
    pub fn register(&mut self, trainer: Arc<dyn VariantTrainer>) -> &mut Self {
        self.trainers.insert(trainer.variant(), trainer);
        self
    }

    pub fn get(&self, variant: ModelVariant) -> Option<Arc<dyn VariantTrainer>> {
        self.trainers.get(&variant).cloned()
    }

    pub fn variants(&self) -> Vec<ModelVariant> {
        self.trainers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.trainers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trainers.is_empty()
    }
}

impl std::fmt::Debug for VariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantRegistry")
            .field("variants", &self.variants())
            .finish()
    }
}
