//! End-to-end training run
//!
//! Records are split first; the resolver and transformer are fitted on the
//! training partition only and then applied unchanged to both partitions.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::evaluation::{ComparisonTable, Evaluator};
use crate::features::{self, FeatureTransformer, FittedParameters};
use crate::schema::{self, PassengerRecord};
use crate::training::{
    DatasetSplitter, ModelVariant, Partition, TrainEngine, TrainedArtifact, TrainingBatch, VariantOutcome,
    VariantRegistry,
};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::info;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub params: FittedParameters,
    pub partition: Partition,
    pub batch: TrainingBatch,
    pub comparison: ComparisonTable,
}

impl PipelineRun {
    pub fn artifact(&self, variant: ModelVariant) -> Option<&TrainedArtifact> {
        self.batch.get(variant).and_then(VariantOutcome::artifact)
    }

    /// Artifact of the top-ranked variant
    pub fn best_artifact(&self) -> Option<&TrainedArtifact> {
        self.comparison
            .best()
            .and_then(|row| self.artifact(row.report.variant))
    }

    pub fn report(&self) -> String {
        self.comparison.render()
    }
}

/// Split, fit, train and evaluate in one call
#[derive(Debug, Clone, Default)]
pub struct SurvivalPipeline {
    config: PipelineConfig,
    registry: Option<VariantRegistry>,
}

impl SurvivalPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, registry: None }
    }

    /// Train with an explicit registry instead of one built from the config
    pub fn with_registry(mut self, registry: VariantRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_dataframe(&self, df: &DataFrame) -> Result<PipelineRun> {
        let records = schema::records_from_dataframe(df)?;
        self.run(&records)
    }

    /// Run the full pipeline over labeled records.
    ///
    /// Schema and transform errors abort the run; variant failures are
    /// reported in the comparison table.
    pub fn run(&self, records: &[PassengerRecord]) -> Result<PipelineRun> {
        let start = Instant::now();
        self.config.validate()?;
        schema::validate_records(records)?;
        let labels = schema::labels(records)?;

        let split = &self.config.split;
        let partition = DatasetSplitter::new(split.eval_fraction)
            .with_random_state(split.random_state)
            .with_stratify(split.stratify)
            .split(records.len(), split.stratify.then_some(labels.as_slice()))?;
        info!(
            n_records = records.len(),
            n_train = partition.train.len(),
            n_eval = partition.eval.len(),
            "split records"
        );

        let train_records = partition.train_items(records);
        let eval_records = partition.eval_items(records);

        let transformer = FeatureTransformer::new(self.config.features.clone());
        let params = transformer.fit(&train_records)?;
        let train_vectors = transformer.apply_all(&train_records, &params)?;
        let eval_vectors = transformer.apply_all(&eval_records, &params)?;

        let x_train = features::feature_matrix(&train_vectors);
        let y_train = features::label_array(&train_vectors)?;
        let x_eval = features::feature_matrix(&eval_vectors);
        let y_eval = features::label_array(&eval_vectors)?;

        let engine = match &self.registry {
            Some(registry) => TrainEngine::with_registry(registry.clone(), &self.config.training),
            None => TrainEngine::new(&self.config.training),
        };
        let mut batch = engine.train_all(&x_train, &y_train, &params.feature_names)?;
        batch.bind_parameters(&params.fingerprint()?);

        let evaluator = Evaluator::new(self.config.evaluation.clone());
        let comparison = evaluator.evaluate_batch(&batch, &x_eval, &y_eval);

        info!(
            best = ?comparison.best().map(|r| r.report.variant),
            failed = comparison.failed.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "pipeline finished"
        );

        Ok(PipelineRun {
            params,
            partition,
            batch,
            comparison,
        })
    }
}
