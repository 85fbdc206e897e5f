//! Inference on new passenger records
//!
//! A [`Predictor`] pairs one trained artifact with the fitted parameters it
//! was trained under, so unseen records go through the exact same
//! resolution and feature steps before prediction.

use crate::error::{Result, SurvivalError};
use crate::export::ArtifactStore;
use crate::features::{self, FeatureConfig, FeatureTransformer, FittedParameters};
use crate::schema::{self, columns, PassengerRecord};
use crate::training::{ModelVariant, TrainedArtifact};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Predicted label for one passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub passenger_id: u32,
    pub survived: bool,
}

/// Trained artifact plus the parameters needed to featurize new records
#[derive(Debug, Clone)]
pub struct Predictor {
    params: FittedParameters,
    artifact: TrainedArtifact,
    transformer: FeatureTransformer,
}

impl Predictor {
    pub fn new(params: FittedParameters, artifact: TrainedArtifact) -> Result<Self> {
        params.check_compatible()?;
        if artifact.feature_names != params.feature_names {
            return Err(SurvivalError::Evaluation {
                variant: artifact.variant.to_string(),
                reason: "artifact was trained on a different feature layout".to_string(),
            });
        }
        if let Some(fingerprint) = &artifact.params_fingerprint {
            if *fingerprint != params.fingerprint()? {
                return Err(SurvivalError::Evaluation {
                    variant: artifact.variant.to_string(),
                    reason: "artifact was trained under different fitted parameters".to_string(),
                });
            }
        }
        Ok(Self {
            params,
            artifact,
            transformer: FeatureTransformer::new(FeatureConfig::default()),
        })
    }

    /// Load the fitted parameters and one variant's artifact from a store
    pub fn from_store(store: &ArtifactStore, variant: ModelVariant) -> Result<Self> {
        let params = store.load_parameters()?;
        let artifact = store.load_artifact(variant)?;
        Self::new(params, artifact)
    }

    pub fn variant(&self) -> ModelVariant {
        self.artifact.variant
    }

    pub fn predict(&self, records: &[PassengerRecord]) -> Result<Vec<Prediction>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        schema::validate_records(records)?;
        let vectors = self.transformer.apply_all(records, &self.params)?;
        let x = features::feature_matrix(&vectors);
        let labels = self.artifact.predict(&x)?;

        info!(variant = %self.artifact.variant, n_records = records.len(), "predicted");
        Ok(vectors
            .iter()
            .zip(labels.iter())
            .map(|(v, &label)| Prediction {
                passenger_id: v.passenger_id,
                survived: label >= 0.5,
            })
            .collect())
    }

    pub fn predict_dataframe(&self, df: &DataFrame) -> Result<Vec<Prediction>> {
        let records = schema::records_from_dataframe(df)?;
        self.predict(&records)
    }
}

/// Predictions as a `PassengerId`, `Survived` (0/1) frame
pub fn predictions_to_dataframe(predictions: &[Prediction]) -> Result<DataFrame> {
    let ids: Vec<u32> = predictions.iter().map(|p| p.passenger_id).collect();
    let survived: Vec<i32> = predictions.iter().map(|p| i32::from(p.survived)).collect();
    Ok(df!(
        columns::PASSENGER_ID => ids,
        columns::SURVIVED => survived
    )?)
}
