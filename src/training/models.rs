//! Model trait and trained artifacts

use super::config::ModelVariant;
use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::{Result, SurvivalError};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Trait for binary classifiers
pub trait Model: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Make predictions (0.0 / 1.0)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Width of the matrix the model was fitted on
    fn n_features(&self) -> usize;
}

/// Fitted classifier of any variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "lowercase")]
pub enum TrainedModel {
    Logistic(LogisticRegression),
    Forest(RandomForest),
    Boosted(GradientBoostingClassifier),
}

impl TrainedModel {
    pub fn variant(&self) -> ModelVariant {
        match self {
            TrainedModel::Logistic(_) => ModelVariant::Logistic,
            TrainedModel::Forest(_) => ModelVariant::Forest,
            TrainedModel::Boosted(_) => ModelVariant::Boosted,
        }
    }

    fn as_model(&self) -> &dyn Model {
        match self {
            TrainedModel::Logistic(m) => m,
            TrainedModel::Forest(m) => m,
            TrainedModel::Boosted(m) => m,
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_model().predict(x)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_model().predict_proba(x)
    }

    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        self.as_model().feature_importances()
    }

    pub fn n_features(&self) -> usize {
        self.as_model().n_features()
    }
}

/// A trained model bound to its variant, read-only after training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub variant: ModelVariant,
    /// Column names of the matrix the model was trained on
    pub feature_names: Vec<String>,
    pub n_training_samples: usize,
    pub training_time_secs: f64,
    pub trained_at: DateTime<Utc>,
    /// Fingerprint of the fitted parameters that produced the training matrix
    #[serde(default)]
    pub params_fingerprint: Option<String>,
    model: TrainedModel,
}

impl TrainedArtifact {
    pub fn new(
        model: TrainedModel,
        feature_names: Vec<String>,
        n_training_samples: usize,
        training_time_secs: f64,
    ) -> Self {
        Self {
            variant: model.variant(),
            feature_names,
            n_training_samples,
            training_time_secs,
            trained_at: Utc::now(),
            params_fingerprint: None,
            model,
        }
    }

    /// Record which fitted parameters this artifact belongs to
    pub fn with_params_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.params_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Fail with an evaluation error when `x` does not match the training width
    pub fn check_shape(&self, x: &Array2<f64>) -> Result<()> {
        let expected = self.feature_names.len();
        if x.ncols() != expected || self.model.n_features() != expected {
            return Err(SurvivalError::Evaluation {
                variant: self.variant.to_string(),
                reason: format!(
                    "feature shape mismatch: artifact expects {} columns, got {}",
                    expected,
                    x.ncols()
                ),
            });
        }
        Ok(())
    }

    /// Predict labels (0.0 / 1.0) for a feature matrix
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_shape(x)?;
        self.model.predict(x)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_shape(x)?;
        self.model.predict_proba(x)
    }

    /// Feature importances keyed by column name
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        self.model.feature_importances().map(|imp| {
            self.feature_names
                .iter()
                .cloned()
                .zip(imp.iter().copied())
                .collect()
        })
    }
}
