//! Error types for the survival pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SurvivalError>;

/// Main error type for the survival pipeline
#[derive(Error, Debug)]
pub enum SurvivalError {
    /// Malformed input: a required raw field is absent or invalid
    #[error("Schema error: passenger {passenger_id:?}, field `{field}`: {reason}")]
    Schema {
        passenger_id: Option<u32>,
        field: String,
        reason: String,
    },

    /// Fitted parameters missing or applied to incompatible input
    #[error("Transform error: {0}")]
    Transform(String),

    /// One variant's fit failed
    #[error("Training failure for `{variant}`: {reason}")]
    Training { variant: String, reason: String },

    /// Artifact missing or incompatible with the evaluation data
    #[error("Evaluation error for `{variant}`: {reason}")]
    Evaluation { variant: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceError { iterations: usize },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl SurvivalError {
    /// Shorthand for a schema error on a known passenger
    pub fn schema(passenger_id: Option<u32>, field: &str, reason: impl Into<String>) -> Self {
        SurvivalError::Schema {
            passenger_id,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the run rather than a single variant
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SurvivalError::Training { .. } | SurvivalError::Evaluation { .. }
        )
    }
}

impl From<polars::error::PolarsError> for SurvivalError {
    fn from(err: polars::error::PolarsError) -> Self {
        SurvivalError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for SurvivalError {
    fn from(err: serde_json::Error) -> Self {
        SurvivalError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SurvivalError {
    fn from(err: ndarray::ShapeError) -> Self {
        SurvivalError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
