//! Pipeline configuration
//!
//! Every knob the pipeline reads lives here; nothing falls back to a hidden
//! default at run time. Loadable from JSON, where missing sections take the
//! defaults below.

use crate::error::{Result, SurvivalError};
use crate::evaluation::{EvaluationConfig, Metric};
use crate::features::FeatureConfig;
use crate::training::{ModelVariant, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Train/evaluation split settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of records held out for evaluation
    pub eval_fraction: f64,
    /// Seed for the partition shuffle
    pub random_state: u64,
    /// Preserve the survival ratio in both partitions
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            eval_fraction: 0.2,
            random_state: 42,
            stratify: true,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub training: TrainingConfig,
    pub evaluation: EvaluationConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seed both the split and the model variants
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.random_state = seed;
        self.training.random_state = Some(seed);
        self
    }

    pub fn with_eval_fraction(mut self, fraction: f64) -> Self {
        self.split.eval_fraction = fraction;
        self
    }

    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.split.stratify = stratify;
        self
    }

    pub fn with_min_title_frequency(mut self, min_frequency: usize) -> Self {
        self.features.min_title_frequency = min_frequency;
        self
    }

    pub fn with_fare_bins(mut self, n_bins: usize) -> Self {
        self.features.n_fare_bins = n_bins;
        self
    }

    pub fn with_primary_metric(mut self, metric: Metric) -> Self {
        self.evaluation.primary_metric = metric;
        self
    }

    pub fn with_variants(mut self, variants: Vec<ModelVariant>) -> Self {
        self.training.variants = variants;
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.split.eval_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(SurvivalError::Config(format!(
                "eval_fraction must lie strictly between 0 and 1, got {}",
                fraction
            )));
        }
        self.features.validate()?;
        self.training.validate()?;
        Ok(())
    }
}
