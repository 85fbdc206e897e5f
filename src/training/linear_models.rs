//! Logistic regression for binary survival classification

use super::models::Model;
use crate::error::{Result, SurvivalError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Treat hitting `max_iter` before `tol` as a failure
    pub strict_convergence: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            strict_convergence: false,
        }
    }
}

/// Logistic regression on standardised inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub config: LogisticConfig,
    /// Column means learned at fit
    means: Option<Array1<f64>>,
    /// Column standard deviations learned at fit (zeros replaced by one)
    stds: Option<Array1<f64>>,
    /// Fitted coefficients (standardised space)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Iterations run by the last fit
    pub n_iter: usize,
    /// Whether the last fit reached the tolerance
    pub converged: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            means: None,
            stds: None,
            coefficients: None,
            intercept: None,
            n_iter: 0,
            converged: false,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.config.learning_rate = lr;
        self
    }

    pub fn with_strict_convergence(mut self, strict: bool) -> Self {
        self.config.strict_convergence = strict;
        self
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    fn standardize(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match (&self.means, &self.stds) {
            (Some(means), Some(stds)) => Ok((x - means) / stds),
            _ => Err(SurvivalError::ModelNotFitted),
        }
    }
}

impl Model for LogisticRegression {
    /// Fit the model using batch gradient descent
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(SurvivalError::Data("cannot fit on an empty matrix".to_string()));
        }

        let means = x.mean_axis(Axis(0)).ok_or_else(|| SurvivalError::Data("empty matrix".to_string()))?;
        let stds = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 1e-12 { s } else { 1.0 });
        self.means = Some(means);
        self.stds = Some(stds);
        let xs = self.standardize(x)?;

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;

        let lr = self.config.learning_rate;
        let alpha = self.config.alpha;
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.config.max_iter {
            iterations = iter + 1;

            let linear = xs.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (xs.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.config.tol {
                converged = true;
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;

            if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(SurvivalError::ConvergenceError { iterations });
            }
        }

        if !converged && self.config.strict_convergence {
            return Err(SurvivalError::ConvergenceError { iterations });
        }

        debug!(iterations, converged, "logistic regression fitted");
        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.n_iter = iterations;
        self.converged = converged;

        Ok(())
    }

    /// Predict probabilities
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(SurvivalError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = self.standardize(x)?.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Absolute standardised coefficients, normalised to sum to one
    fn feature_importances(&self) -> Option<Array1<f64>> {
        let coefficients = self.coefficients.as_ref()?;
        let abs = coefficients.mapv(f64::abs);
        let total = abs.sum();
        if total > 0.0 {
            Some(abs / total)
        } else {
            Some(abs)
        }
    }

    fn n_features(&self) -> usize {
        self.coefficients.as_ref().map_or(0, |c| c.len())
    }
}
