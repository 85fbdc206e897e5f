//! Artifact persistence
//!
//! A directory holding one pretty-printed JSON file per trained variant
//! (`<variant>.json`), the fitted transform parameters and, after a full
//! run, the comparison table.

use crate::error::{Result, SurvivalError};
use crate::evaluation::ComparisonTable;
use crate::features::FittedParameters;
use crate::pipeline::PipelineRun;
use crate::training::{ModelVariant, TrainedArtifact};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const PARAMETERS_FILE: &str = "fitted_parameters.json";
const COMPARISON_FILE: &str = "comparison.json";

/// Directory of persisted artifacts, addressable by variant
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create or open a store at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| {
                SurvivalError::Data(format!("Failed to create artifact dir {}: {}", root.display(), e))
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, variant: ModelVariant) -> PathBuf {
        self.root.join(format!("{}.json", variant))
    }

    pub fn save_artifact(&self, artifact: &TrainedArtifact) -> Result<PathBuf> {
        let path = self.artifact_path(artifact.variant);
        write_json(&path, artifact)?;
        info!(variant = %artifact.variant, path = %path.display(), "saved artifact");
        Ok(path)
    }

    /// Load the artifact of one variant
    pub fn load_artifact(&self, variant: ModelVariant) -> Result<TrainedArtifact> {
        let path = self.artifact_path(variant);
        if !path.exists() {
            return Err(SurvivalError::Evaluation {
                variant: variant.to_string(),
                reason: format!("no artifact at {}", path.display()),
            });
        }
        read_json(&path)
    }

    /// Delete a variant's artifact, returning whether one existed
    pub fn remove_artifact(&self, variant: ModelVariant) -> Result<bool> {
        let path = self.artifact_path(variant);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(variant = %variant, path = %path.display(), "removed stale artifact");
        Ok(true)
    }

    /// Variants with an artifact on disk, in canonical order
    pub fn variants(&self) -> Vec<ModelVariant> {
        ModelVariant::ALL
            .into_iter()
            .filter(|v| self.artifact_path(*v).exists())
            .collect()
    }

    pub fn save_parameters(&self, params: &FittedParameters) -> Result<PathBuf> {
        let path = self.root.join(PARAMETERS_FILE);
        write_json(&path, params)?;
        Ok(path)
    }

    pub fn load_parameters(&self) -> Result<FittedParameters> {
        let path = self.root.join(PARAMETERS_FILE);
        if !path.exists() {
            return Err(SurvivalError::Transform(format!(
                "no fitted parameters at {}",
                path.display()
            )));
        }
        let params: FittedParameters = read_json(&path)?;
        params.check_compatible()?;
        Ok(params)
    }

    pub fn save_comparison(&self, table: &ComparisonTable) -> Result<PathBuf> {
        let path = self.root.join(COMPARISON_FILE);
        write_json(&path, table)?;
        Ok(path)
    }

    pub fn load_comparison(&self) -> Result<ComparisonTable> {
        read_json(&self.root.join(COMPARISON_FILE))
    }

    /// Persist parameters, every trained artifact and the comparison table.
    ///
    /// Artifacts left by an earlier run for variants that did not train this
    /// time are removed, so the store only pairs models with the parameters
    /// they were trained under.
    pub fn save_run(&self, run: &PipelineRun) -> Result<()> {
        for variant in ModelVariant::ALL {
            if run.artifact(variant).is_none() {
                self.remove_artifact(variant)?;
            }
        }
        self.save_parameters(&run.params)?;
        for artifact in run.batch.artifacts() {
            self.save_artifact(artifact)?;
        }
        self.save_comparison(&run.comparison)?;
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{LogisticRegression, Model, TrainedModel};
    use ndarray::array;
    use tempfile::TempDir;

    fn artifact() -> TrainedArtifact {
        let x = array![[0.0], [1.0], [9.0], [10.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        TrainedArtifact::new(TrainedModel::Logistic(model), vec!["x".to_string()], 4, 0.0)
    }

    #[test]
    fn test_save_and_load_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let saved = artifact();
        let path = store.save_artifact(&saved).unwrap();
        assert!(path.ends_with("logistic.json"));

        let loaded = store.load_artifact(ModelVariant::Logistic).unwrap();
        assert_eq!(loaded.variant, ModelVariant::Logistic);
        assert_eq!(loaded.trained_at, saved.trained_at);
        let x = array![[0.5], [9.5]];
        assert_eq!(loaded.predict(&x).unwrap(), saved.predict(&x).unwrap());
        assert_eq!(store.variants(), vec![ModelVariant::Logistic]);
    }

    #[test]
    fn test_remove_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        store.save_artifact(&artifact()).unwrap();

        assert!(store.remove_artifact(ModelVariant::Logistic).unwrap());
        assert!(!store.remove_artifact(ModelVariant::Logistic).unwrap());
        assert!(store.variants().is_empty());
    }

    #[test]
    fn test_fingerprint_survives_save() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        store.save_artifact(&artifact().with_params_fingerprint("abc123")).unwrap();
        let loaded = store.load_artifact(ModelVariant::Logistic).unwrap();
        assert_eq!(loaded.params_fingerprint.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let err = store.load_artifact(ModelVariant::Forest).unwrap_err();
        assert!(matches!(err, SurvivalError::Evaluation { .. }));
        assert!(matches!(store.load_parameters(), Err(SurvivalError::Transform(_))));
    }
}
