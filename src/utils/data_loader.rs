//! CSV loading and saving at the tabular boundary

use crate::error::{Result, SurvivalError};
use crate::inference::{predictions_to_dataframe, Prediction};
use crate::schema::{self, PassengerRecord};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// CSV loader
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    /// Rows scanned for schema inference (whole file when `None`)
    infer_schema_length: Option<usize>,
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit schema inference to the first `n` rows
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| SurvivalError::Data(format!("{}: {}", path.display(), e)))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file);

        let df = reader.finish()?;
        info!(path = %path.display(), rows = df.height(), cols = df.width(), "loaded csv");
        Ok(df)
    }

    /// Load a passenger manifest into typed records
    pub fn load_passengers(&self, path: impl AsRef<Path>) -> Result<Vec<PassengerRecord>> {
        let df = self.load_csv(path)?;
        schema::records_from_dataframe(&df)
    }
}

/// CSV writer
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }

    /// Save `PassengerId,Survived` rows
    pub fn save_predictions(predictions: &[Prediction], path: impl AsRef<Path>) -> Result<()> {
        let mut df = predictions_to_dataframe(predictions)?;
        Self::save_csv(&mut df, path)
    }
}
