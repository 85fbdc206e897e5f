//! Feature engineering
//!
//! A two-phase transformer: [`FeatureTransformer::fit`] learns every
//! data-dependent parameter from training records only, and
//! [`FeatureTransformer::apply`] turns a record plus those parameters into a
//! [`FeatureVector`] without consulting anything else.
//!
//! Engineered features:
//! - family size (`sibsp + parch + 1`) and the is-alone flag
//! - canonical title category with a low-frequency fallback
//! - fare quartile bin
//! - labeled age bucket

pub mod binning;
pub mod title;

pub use binning::{AgeBins, FareBins};
pub use title::{TitleCategory, TitleVocabulary};

use crate::error::{Result, SurvivalError};
use crate::schema::{self, MissingValueResolver, PassengerRecord, Port, ResolvedRecord, ResolverParams, Sex};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

/// Column order of the model matrix
pub const FEATURE_NAMES: [&str; 13] = [
    "pclass",
    "sex",
    "age",
    "sibsp",
    "parch",
    "fare",
    "embarked",
    "has_cabin",
    "family_size",
    "is_alone",
    "title",
    "fare_bin",
    "age_bin",
];

/// Feature engineering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Minimum training count for a title category to keep its own bucket
    pub min_title_frequency: usize,
    /// Number of fare quantile bins
    pub n_fare_bins: usize,
    /// Interior age cut points
    pub age_cuts: Vec<f64>,
    /// One label per age bin
    pub age_labels: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_title_frequency: 10,
            n_fare_bins: 4,
            age_cuts: vec![16.0, 60.0],
            age_labels: vec!["child".to_string(), "adult".to_string(), "senior".to_string()],
        }
    }
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_title_frequency(mut self, min_frequency: usize) -> Self {
        self.min_title_frequency = min_frequency;
        self
    }

    pub fn with_fare_bins(mut self, n_bins: usize) -> Self {
        self.n_fare_bins = n_bins;
        self
    }

    /// Set age cut points and their bin labels
    pub fn with_age_bins(mut self, cuts: Vec<f64>, labels: Vec<String>) -> Self {
        self.age_cuts = cuts;
        self.age_labels = labels;
        self
    }

    /// Number of age bins implied by the cut points
    pub fn n_age_bins(&self) -> usize {
        self.age_cuts.len() + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_fare_bins == 0 {
            return Err(SurvivalError::Config("n_fare_bins must be at least 1".to_string()));
        }
        if self.age_cuts.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return Err(SurvivalError::Config("age cuts must be finite and positive".to_string()));
        }
        if self.age_cuts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SurvivalError::Config("age cuts must be strictly increasing".to_string()));
        }
        if self.age_labels.len() != self.n_age_bins() {
            return Err(SurvivalError::Config(format!(
                "expected {} age labels, got {}",
                self.n_age_bins(),
                self.age_labels.len()
            )));
        }
        Ok(())
    }
}

/// Everything learned from the training partition.
///
/// Immutable once produced; evaluation and inference records reuse it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParameters {
    pub resolver: ResolverParams,
    pub fare_bins: FareBins,
    pub age_bins: AgeBins,
    pub titles: TitleVocabulary,
    pub feature_names: Vec<String>,
    /// Number of training records the parameters were fitted on
    pub n_training_records: usize,
}

impl FittedParameters {
    /// Fail if these parameters describe a different feature layout
    pub fn check_compatible(&self) -> Result<()> {
        if self.feature_names.len() != FEATURE_NAMES.len()
            || self.feature_names.iter().zip(FEATURE_NAMES.iter()).any(|(a, b)| a != b)
        {
            return Err(SurvivalError::Transform(format!(
                "fitted parameters describe features {:?}, expected {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        Ok(())
    }

    /// SHA-256 of the serialised parameters, hex encoded
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Engineered features of one passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub passenger_id: u32,
    pub pclass: u8,
    pub sex: Sex,
    pub age: f64,
    pub sibsp: u32,
    pub parch: u32,
    pub fare: f64,
    pub embarked: Port,
    pub has_cabin: bool,
    pub family_size: u32,
    pub is_alone: bool,
    pub title: TitleCategory,
    pub fare_bin: usize,
    pub age_bin: usize,
    pub age_group: String,
    pub survived: Option<bool>,
}

impl FeatureVector {
    /// Numeric row in [`FEATURE_NAMES`] order
    pub fn to_row(&self) -> [f64; FEATURE_NAMES.len()] {
        [
            self.pclass as f64,
            self.sex.code(),
            self.age,
            self.sibsp as f64,
            self.parch as f64,
            self.fare,
            self.embarked.code(),
            bool_code(self.has_cabin),
            self.family_size as f64,
            bool_code(self.is_alone),
            self.title.code(),
            self.fare_bin as f64,
            self.age_bin as f64,
        ]
    }

    /// Numeric value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.to_row()[idx])
    }

    /// `(name, value)` pairs in matrix order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_row())
    }
}

fn bool_code(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Fit/apply feature transformer
#[derive(Debug, Clone, Default)]
pub struct FeatureTransformer {
    config: FeatureConfig,
    resolver: MissingValueResolver,
}

impl FeatureTransformer {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            resolver: MissingValueResolver::new(),
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Learn resolver values, bin edges and the title vocabulary from
    /// training records.
    pub fn fit(&self, training: &[PassengerRecord]) -> Result<FittedParameters> {
        self.config.validate()?;
        schema::validate_records(training)?;

        let resolver_params = self.resolver.fit(training)?;
        let resolved = self.resolver.resolve_all(training, &resolver_params)?;

        let fares: Vec<f64> = resolved.iter().map(|r| r.fare).collect();
        let ages: Vec<f64> = resolved.iter().map(|r| r.age).collect();
        let fare_bins = FareBins::fit(&fares, self.config.n_fare_bins)?;
        let age_bins = AgeBins::fit(&ages, &self.config.age_cuts, &self.config.age_labels)?;
        let titles = TitleVocabulary::fit(
            resolved.iter().map(|r| r.name.as_str()),
            self.config.min_title_frequency,
        );

        info!(
            n_records = training.len(),
            fare_edges = ?fare_bins.edges(),
            age_edges = ?age_bins.edges(),
            titles = ?titles.categories().collect::<Vec<_>>(),
            "Fitted feature transformer"
        );

        Ok(FittedParameters {
            resolver: resolver_params,
            fare_bins,
            age_bins,
            titles,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            n_training_records: training.len(),
        })
    }

    /// Transform one record with fitted parameters
    pub fn apply(&self, record: &PassengerRecord, params: &FittedParameters) -> Result<FeatureVector> {
        params.check_compatible()?;
        let resolved = self.resolver.resolve(record, &params.resolver)?;
        Ok(engineer(resolved, params))
    }

    /// Transform a batch of records with fitted parameters
    pub fn apply_all(&self, records: &[PassengerRecord], params: &FittedParameters) -> Result<Vec<FeatureVector>> {
        params.check_compatible()?;
        records
            .iter()
            .map(|r| {
                let resolved = self.resolver.resolve(r, &params.resolver)?;
                Ok(engineer(resolved, params))
            })
            .collect()
    }
}

fn engineer(record: ResolvedRecord, params: &FittedParameters) -> FeatureVector {
    let family_size = record.sibsp + record.parch + 1;
    let age_bin = params.age_bins.bin(record.age);

    FeatureVector {
        passenger_id: record.passenger_id,
        pclass: record.pclass,
        sex: record.sex,
        age: record.age,
        sibsp: record.sibsp,
        parch: record.parch,
        fare: record.fare,
        embarked: record.embarked,
        has_cabin: record.has_cabin,
        family_size,
        is_alone: family_size == 1,
        title: params.titles.categorize(&record.name),
        fare_bin: params.fare_bins.bin(record.fare),
        age_bin,
        age_group: params.age_bins.label(age_bin).to_string(),
        survived: record.survived,
    }
}

/// Stack feature vectors into a row-major model matrix
pub fn feature_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
    let rows: Vec<_> = vectors.iter().map(FeatureVector::to_row).collect();
    Array2::from_shape_fn((rows.len(), FEATURE_NAMES.len()), |(r, c)| rows[r][c])
}

/// Survival labels as 0/1, failing on unlabeled vectors
pub fn label_array(vectors: &[FeatureVector]) -> Result<Array1<f64>> {
    vectors
        .iter()
        .map(|v| {
            v.survived.map(bool_code).ok_or_else(|| {
                SurvivalError::schema(Some(v.passenger_id), schema::columns::SURVIVED, "missing label")
            })
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from_vec)
}
