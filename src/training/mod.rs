//! Model training module
//!
//! Provides the classifier variants and the harness that trains them:
//! - Logistic regression, random forest and gradient boosting behind [`Model`]
//! - [`VariantTrainer`] capability and the configuration-driven [`VariantRegistry`]
//! - [`TrainEngine`] for isolated, time-bounded training of every variant
//! - [`DatasetSplitter`] for reproducible train/evaluation partitions

mod config;
mod engine;
mod models;
mod registry;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod random_forest;
pub mod split;

pub use config::{ModelVariant, TrainingConfig};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainingBatch, VariantOutcome};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear_models::{LogisticConfig, LogisticRegression};
pub use models::{Model, TrainedArtifact, TrainedModel};
pub use random_forest::{ForestConfig, MaxFeatures, RandomForest};
pub use registry::{BoostedTrainer, ForestTrainer, LogisticTrainer, VariantRegistry, VariantTrainer};
pub use split::{DatasetSplitter, Partition};
