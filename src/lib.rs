//! Titanic survival - feature engineering and multi-model classification
//!
//! This crate turns a passenger manifest into survival predictions:
//! - Schema validation and missing-value resolution
//! - Fit/apply feature engineering (titles, family size, fare and age bins)
//! - Reproducible, optionally stratified train/evaluation splits
//! - Isolated training of several classifier variants with partial-failure semantics
//! - Evaluation and ranked comparison of the trained variants
//!
//! # Modules
//!
//! - [`schema`] - Passenger records and the missing-value resolver
//! - [`features`] - Feature transformer and fitted parameters
//! - [`training`] - Classifier variants, registry, engine and splitter
//! - [`evaluation`] - Metrics, evaluator and comparison table
//! - [`pipeline`] - End-to-end run
//! - [`inference`] - Predictions on new records
//! - [`export`] - Artifact persistence
//! - [`utils`] - CSV loading and saving
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core pipeline stages
pub mod schema;
pub mod features;
pub mod training;
pub mod evaluation;
pub mod pipeline;

// Outputs
pub mod inference;
pub mod export;

// Utilities
pub mod utils;
pub mod cli;

pub use error::{Result, SurvivalError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{PipelineConfig, SplitConfig};
    pub use crate::error::{Result, SurvivalError};
    pub use crate::evaluation::{ComparisonTable, EvaluationConfig, EvaluationReport, Evaluator, Metric};
    pub use crate::export::ArtifactStore;
    pub use crate::features::{FeatureConfig, FeatureTransformer, FeatureVector, FittedParameters};
    pub use crate::inference::{Prediction, Predictor};
    pub use crate::pipeline::{PipelineRun, SurvivalPipeline};
    pub use crate::schema::{PassengerRecord, Port, Sex};
    pub use crate::training::{
        DatasetSplitter, ModelVariant, TrainEngine, TrainedArtifact, TrainingBatch, TrainingConfig, VariantOutcome,
        VariantRegistry, VariantTrainer,
    };
    pub use crate::utils::{DataLoader, DataSaver};
}
