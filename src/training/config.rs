//! Training configuration

use super::gradient_boosting::GradientBoostingConfig;
use super::linear_models::LogisticConfig;
use super::random_forest::{ForestConfig, MaxFeatures};
use crate::error::{Result, SurvivalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Classifier variant identifiers, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Regularised logistic regression
    Logistic,
    /// Bootstrap random forest
    Forest,
    /// Gradient-boosted trees
    Boosted,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [ModelVariant::Logistic, ModelVariant::Forest, ModelVariant::Boosted];

    pub fn id(self) -> &'static str {
        match self {
            ModelVariant::Logistic => "logistic",
            ModelVariant::Forest => "forest",
            ModelVariant::Boosted => "boosted",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelVariant {
    type Err = SurvivalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logistic" => Ok(ModelVariant::Logistic),
            "forest" => Ok(ModelVariant::Forest),
            "boosted" => Ok(ModelVariant::Boosted),
            other => Err(SurvivalError::Config(format!("unknown model variant '{}'", other))),
        }
    }
}

/// Configuration for the training batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Enabled variants
    pub variants: Vec<ModelVariant>,

    /// Random seed for reproducibility
    pub random_state: Option<u64>,

    /// Train variants on concurrent workers
    pub parallel: bool,

    /// Per-batch (parallel) or per-variant (sequential) time limit
    pub timeout_secs: Option<f64>,

    pub logistic: LogisticConfig,
    pub forest: ForestConfig,
    pub boosted: GradientBoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            variants: ModelVariant::ALL.to_vec(),
            random_state: Some(42),
            parallel: true,
            timeout_secs: None,
            logistic: LogisticConfig::default(),
            forest: ForestConfig::default(),
            boosted: GradientBoostingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the enabled variants
    pub fn with_variants(mut self, variants: Vec<ModelVariant>) -> Self {
        self.variants = variants;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to toggle parallel training
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method to set the training timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    pub fn with_logistic(mut self, config: LogisticConfig) -> Self {
        self.logistic = config;
        self
    }

    pub fn with_forest(mut self, config: ForestConfig) -> Self {
        self.forest = config;
        self
    }

    pub fn with_boosted(mut self, config: GradientBoostingConfig) -> Self {
        self.boosted = config;
        self
    }

    /// Timeout as a duration; `None` when unset or not representable
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.and_then(|t| Duration::try_from_secs_f64(t).ok())
    }

    /// Enabled variants, deduplicated, in canonical order
    pub fn enabled_variants(&self) -> Vec<ModelVariant> {
        let mut variants = self.variants.clone();
        variants.sort();
        variants.dedup();
        variants
    }

    pub fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(SurvivalError::Config("at least one model variant must be enabled".to_string()));
        }
        if let Some(t) = self.timeout_secs {
            if !(t.is_finite() && t > 0.0) {
                return Err(invalid("timeout_secs", t, "must be a positive number of seconds"));
            }
            if Duration::try_from_secs_f64(t).is_err() {
                return Err(invalid("timeout_secs", t, "too large to represent as a duration"));
            }
        }
        if self.logistic.max_iter == 0 {
            return Err(invalid("logistic.max_iter", 0, "must be at least 1"));
        }
        if self.forest.n_estimators == 0 {
            return Err(invalid("forest.n_estimators", 0, "must be at least 1"));
        }
        if let MaxFeatures::Fraction(f) = self.forest.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(invalid("forest.max_features", f, "fraction must be in (0, 1]"));
            }
        }
        if self.boosted.n_estimators == 0 {
            return Err(invalid("boosted.n_estimators", 0, "must be at least 1"));
        }
        for (name, ratio) in [
            ("boosted.subsample", self.boosted.subsample),
            ("boosted.colsample_bytree", self.boosted.colsample_bytree),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(invalid(name, ratio, "ratio must be in (0, 1]"));
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl fmt::Display, reason: &str) -> SurvivalError {
    SurvivalError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
