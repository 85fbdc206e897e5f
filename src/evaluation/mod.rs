//! Evaluation of trained artifacts against the held-out partition
//!
//! [`Evaluator::evaluate`] scores one artifact; [`Evaluator::evaluate_batch`]
//! scores a whole training batch and folds training and evaluation failures
//! into a ranked [`ComparisonTable`].

mod comparison;
mod metrics;

pub use comparison::{ComparisonRow, ComparisonTable, FailedVariant, FailureStage};
pub use metrics::{ConfusionMatrix, Metric};

use crate::error::{Result, SurvivalError};
use crate::training::{ModelVariant, TrainedArtifact, TrainingBatch, VariantOutcome};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Metric that orders the comparison table
    pub primary_metric: Metric,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            primary_metric: Metric::F1,
        }
    }
}

impl EvaluationConfig {
    pub fn with_primary_metric(mut self, metric: Metric) -> Self {
        self.primary_metric = metric;
        self
    }
}

/// Fixed metric set for one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub variant: ModelVariant,
    pub n_samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    pub fn from_confusion(variant: ModelVariant, confusion: ConfusionMatrix) -> Self {
        Self {
            variant,
            n_samples: confusion.total(),
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
        }
    }

    /// Compute metrics from true and predicted 0/1 labels
    pub fn compute(variant: ModelVariant, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        Self::from_confusion(variant, ConfusionMatrix::from_predictions(y_true, y_pred))
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::F1 => self.f1,
        }
    }
}

/// Scores artifacts and builds comparison tables
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score one artifact. Errors are [`SurvivalError::Evaluation`] for that variant.
    pub fn evaluate(&self, artifact: &TrainedArtifact, x: &Array2<f64>, y: &Array1<f64>) -> Result<EvaluationReport> {
        let variant = artifact.variant;
        let fail = |reason: String| SurvivalError::Evaluation {
            variant: variant.to_string(),
            reason,
        };

        if x.nrows() == 0 {
            return Err(fail("evaluation set is empty".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(fail(format!("{} rows but {} labels", x.nrows(), y.len())));
        }

        let y_pred = artifact.predict(x).map_err(|e| match e {
            err @ SurvivalError::Evaluation { .. } => err,
            other => fail(other.to_string()),
        })?;

        let report = EvaluationReport::compute(variant, y, &y_pred);
        info!(
            %variant,
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            "variant evaluated"
        );
        Ok(report)
    }

    /// Score every trained artifact of a batch and rank them.
    ///
    /// Variants that failed training, or whose evaluation fails, are listed in
    /// the table's failed section with their reason.
    pub fn evaluate_batch(&self, batch: &TrainingBatch, x: &Array2<f64>, y: &Array1<f64>) -> ComparisonTable {
        let mut reports = Vec::new();
        let mut failed = Vec::new();

        for outcome in &batch.outcomes {
            match outcome {
                VariantOutcome::Trained(artifact) => match self.evaluate(artifact, x, y) {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        warn!(variant = %artifact.variant, error = %e, "evaluation failed");
                        let reason = match e {
                            SurvivalError::Evaluation { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        failed.push(FailedVariant {
                            variant: artifact.variant,
                            stage: FailureStage::Evaluation,
                            reason,
                        });
                    }
                },
                VariantOutcome::Failed { variant, reason } => failed.push(FailedVariant {
                    variant: *variant,
                    stage: FailureStage::Training,
                    reason: reason.clone(),
                }),
            }
        }

        self.compare(reports, failed)
    }

    /// Rank reports by the configured primary metric
    pub fn compare(&self, reports: Vec<EvaluationReport>, failed: Vec<FailedVariant>) -> ComparisonTable {
        ComparisonTable::compare(reports, failed, self.config.primary_metric)
    }
}
