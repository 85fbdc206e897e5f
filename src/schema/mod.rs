//! Passenger schema and missing-value resolution
//!
//! Defines the raw passenger record as it arrives from a loader, the resolved
//! record consumed by feature engineering, and the conversion from a polars
//! `DataFrame` with the standard manifest columns.

mod resolver;

pub use resolver::{MissingValueResolver, ResolverParams};

use crate::error::{Result, SurvivalError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Column names of the passenger manifest
pub mod columns {
    pub const PASSENGER_ID: &str = "PassengerId";
    pub const SURVIVED: &str = "Survived";
    pub const PCLASS: &str = "Pclass";
    pub const NAME: &str = "Name";
    pub const SEX: &str = "Sex";
    pub const AGE: &str = "Age";
    pub const SIBSP: &str = "SibSp";
    pub const PARCH: &str = "Parch";
    pub const FARE: &str = "Fare";
    pub const CABIN: &str = "Cabin";
    pub const EMBARKED: &str = "Embarked";
}

/// Passenger sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Numeric encoding used in the model matrix
    pub fn code(self) -> f64 {
        match self {
            Sex::Male => 0.0,
            Sex::Female => 1.0,
        }
    }
}

impl FromStr for Sex {
    type Err = SurvivalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(SurvivalError::schema(None, columns::SEX, format!("unknown value '{}'", other))),
        }
    }
}

/// Embarkation port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Port {
    /// Southampton
    S,
    /// Cherbourg
    C,
    /// Queenstown
    Q,
}

impl Port {
    /// All ports in canonical order
    pub const ALL: [Port; 3] = [Port::S, Port::C, Port::Q];

    /// Numeric encoding used in the model matrix
    pub fn code(self) -> f64 {
        match self {
            Port::S => 0.0,
            Port::C => 1.0,
            Port::Q => 2.0,
        }
    }
}

impl FromStr for Port {
    type Err = SurvivalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Port::S),
            "C" => Ok(Port::C),
            "Q" => Ok(Port::Q),
            other => Err(SurvivalError::schema(None, columns::EMBARKED, format!("unknown port '{}'", other))),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Port::S => "S",
            Port::C => "C",
            Port::Q => "Q",
        };
        f.write_str(s)
    }
}

/// A passenger record exactly as supplied by the loader.
///
/// Required fields (`passenger_id`, `pclass`, `sex`) are optional here so that
/// their absence can be reported as a schema error instead of a parse panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub passenger_id: Option<u32>,
    pub pclass: Option<u8>,
    pub name: String,
    pub sex: Option<Sex>,
    pub age: Option<f64>,
    pub sibsp: u32,
    pub parch: u32,
    pub fare: Option<f64>,
    pub cabin: Option<String>,
    pub embarked: Option<Port>,
    /// Survival label, present for training records only
    pub survived: Option<bool>,
}

impl PassengerRecord {
    /// Create a record with the required fields set and everything else empty
    pub fn new(passenger_id: u32, pclass: u8, name: impl Into<String>, sex: Sex) -> Self {
        Self {
            passenger_id: Some(passenger_id),
            pclass: Some(pclass),
            name: name.into(),
            sex: Some(sex),
            age: None,
            sibsp: 0,
            parch: 0,
            fare: None,
            cabin: None,
            embarked: None,
            survived: None,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_family(mut self, sibsp: u32, parch: u32) -> Self {
        self.sibsp = sibsp;
        self.parch = parch;
        self
    }

    pub fn with_fare(mut self, fare: f64) -> Self {
        self.fare = Some(fare);
        self
    }

    pub fn with_cabin(mut self, cabin: impl Into<String>) -> Self {
        self.cabin = Some(cabin.into());
        self
    }

    pub fn with_embarked(mut self, port: Port) -> Self {
        self.embarked = Some(port);
        self
    }

    pub fn with_survived(mut self, survived: bool) -> Self {
        self.survived = Some(survived);
        self
    }

    /// Check the required fields and value ranges, returning the identifier
    pub fn validate(&self) -> Result<u32> {
        let id = self
            .passenger_id
            .ok_or_else(|| SurvivalError::schema(None, columns::PASSENGER_ID, "missing identifier"))?;
        match self.pclass {
            None => return Err(SurvivalError::schema(Some(id), columns::PCLASS, "missing passenger class")),
            Some(c) if !(1..=3).contains(&c) => {
                return Err(SurvivalError::schema(Some(id), columns::PCLASS, format!("class {} outside 1..=3", c)))
            }
            _ => {}
        }
        if self.sex.is_none() {
            return Err(SurvivalError::schema(Some(id), columns::SEX, "missing sex"));
        }
        if let Some(age) = self.age {
            if age.is_finite() && age < 0.0 {
                return Err(SurvivalError::schema(Some(id), columns::AGE, format!("negative age {}", age)));
            }
        }
        if let Some(fare) = self.fare {
            if fare.is_finite() && fare < 0.0 {
                return Err(SurvivalError::schema(Some(id), columns::FARE, format!("negative fare {}", fare)));
            }
        }
        Ok(id)
    }

    /// Age if present and finite
    pub(crate) fn known_age(&self) -> Option<f64> {
        self.age.filter(|a| a.is_finite())
    }

    /// Fare if present and finite
    pub(crate) fn known_fare(&self) -> Option<f64> {
        self.fare.filter(|f| f.is_finite())
    }
}

/// A passenger record with every downstream field filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub passenger_id: u32,
    pub pclass: u8,
    pub name: String,
    pub sex: Sex,
    pub age: f64,
    pub sibsp: u32,
    pub parch: u32,
    pub fare: f64,
    pub has_cabin: bool,
    pub embarked: Port,
    pub survived: Option<bool>,
}

/// Validate every record and check that identifiers are unique
pub fn validate_records(records: &[PassengerRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let id = record.validate()?;
        if !seen.insert(id) {
            return Err(SurvivalError::schema(Some(id), columns::PASSENGER_ID, "duplicate identifier"));
        }
    }
    Ok(())
}

/// Extract survival labels, failing on the first unlabeled record
pub fn labels(records: &[PassengerRecord]) -> Result<Vec<bool>> {
    records
        .iter()
        .map(|r| {
            r.survived
                .ok_or_else(|| SurvivalError::schema(r.passenger_id, columns::SURVIVED, "missing label on training record"))
        })
        .collect()
}

/// Convert a manifest `DataFrame` into passenger records.
///
/// Missing required columns are schema errors. `Survived` is optional so that
/// unlabeled inference files load through the same path.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<PassengerRecord>> {
    let n = df.height();

    let ids = optional_f64_column(df, columns::PASSENGER_ID)?
        .ok_or_else(|| SurvivalError::schema(None, columns::PASSENGER_ID, "column not found"))?;
    let classes = optional_f64_column(df, columns::PCLASS)?
        .ok_or_else(|| SurvivalError::schema(None, columns::PCLASS, "column not found"))?;
    let sexes = optional_str_column(df, columns::SEX)?
        .ok_or_else(|| SurvivalError::schema(None, columns::SEX, "column not found"))?;

    let names = optional_str_column(df, columns::NAME)?.unwrap_or_else(|| vec![None; n]);
    let ages = optional_f64_column(df, columns::AGE)?.unwrap_or_else(|| vec![None; n]);
    let sibsp = optional_f64_column(df, columns::SIBSP)?.unwrap_or_else(|| vec![None; n]);
    let parch = optional_f64_column(df, columns::PARCH)?.unwrap_or_else(|| vec![None; n]);
    let fares = optional_f64_column(df, columns::FARE)?.unwrap_or_else(|| vec![None; n]);
    let cabins = optional_str_column(df, columns::CABIN)?.unwrap_or_else(|| vec![None; n]);
    let ports = optional_str_column(df, columns::EMBARKED)?.unwrap_or_else(|| vec![None; n]);
    let survived = optional_f64_column(df, columns::SURVIVED)?.unwrap_or_else(|| vec![None; n]);

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let passenger_id = ids[i]
            .map(|v| whole_number::<u32>(v, None, columns::PASSENGER_ID))
            .transpose()?;
        let sex = match &sexes[i] {
            Some(s) => Some(s.parse::<Sex>().map_err(|e| with_passenger(e, passenger_id))?),
            None => None,
        };
        let embarked = match ports[i].as_deref().map(str::trim) {
            Some("") | None => None,
            Some(p) => Some(p.parse::<Port>().map_err(|e| with_passenger(e, passenger_id))?),
        };
        records.push(PassengerRecord {
            passenger_id,
            pclass: classes[i]
                .map(|v| whole_number::<u8>(v, passenger_id, columns::PCLASS))
                .transpose()?,
            name: names[i].clone().unwrap_or_default(),
            sex,
            age: ages[i],
            sibsp: sibsp[i]
                .map(|v| whole_number::<u32>(v, passenger_id, columns::SIBSP))
                .transpose()?
                .unwrap_or(0),
            parch: parch[i]
                .map(|v| whole_number::<u32>(v, passenger_id, columns::PARCH))
                .transpose()?
                .unwrap_or(0),
            fare: fares[i],
            cabin: cabins[i].clone().filter(|c| !c.trim().is_empty()),
            embarked,
            survived: survived[i].map(|v| v > 0.5),
        });
    }

    Ok(records)
}

fn with_passenger(err: SurvivalError, passenger_id: Option<u32>) -> SurvivalError {
    match err {
        SurvivalError::Schema { field, reason, .. } => SurvivalError::Schema {
            passenger_id,
            field,
            reason,
        },
        other => other,
    }
}

/// Convert a numeric cell that must hold a non-negative integer
fn whole_number<T: TryFrom<u64>>(value: f64, passenger_id: Option<u32>, field: &str) -> Result<T> {
    let invalid = || SurvivalError::schema(passenger_id, field, format!("expected a non-negative integer, got {}", value));
    if value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
        return Err(invalid());
    }
    T::try_from(value as u64).map_err(|_| invalid())
}

fn optional_f64_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| SurvivalError::schema(None, name, e.to_string()))?;
    let values = casted
        .f64()
        .map_err(|e| SurvivalError::schema(None, name, e.to_string()))?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(Some(values))
}

fn optional_str_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let casted = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| SurvivalError::schema(None, name, e.to_string()))?;
    let values = casted
        .str()
        .map_err(|e| SurvivalError::schema(None, name, e.to_string()))?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_sex() {
        let mut record = PassengerRecord::new(3, 1, "Smith, Mr. John", Sex::Male);
        record.sex = None;
        let err = record.validate().unwrap_err();
        match err {
            SurvivalError::Schema { passenger_id, field, .. } => {
                assert_eq!(passenger_id, Some(3));
                assert_eq!(field, columns::SEX);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_class() {
        let record = PassengerRecord::new(1, 4, "Smith, Mr. John", Sex::Male);
        assert!(matches!(record.validate(), Err(SurvivalError::Schema { .. })));
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let records = vec![
            PassengerRecord::new(1, 3, "A, Mr. B", Sex::Male),
            PassengerRecord::new(1, 2, "C, Mrs. D", Sex::Female),
        ];
        let err = validate_records(&records).unwrap_err();
        assert!(err.to_string().contains("duplicate identifier"));
    }

    #[test]
    fn test_records_from_dataframe() {
        let df = df!(
            "PassengerId" => &[1i64, 2, 3],
            "Survived" => &[0i64, 1, 1],
            "Pclass" => &[3i64, 1, 3],
            "Name" => &["Braund, Mr. Owen Harris", "Cumings, Mrs. John Bradley", "Heikkinen, Miss. Laina"],
            "Sex" => &["male", "female", "female"],
            "Age" => &[Some(22.0), Some(38.0), None],
            "SibSp" => &[1i64, 1, 0],
            "Parch" => &[0i64, 0, 0],
            "Fare" => &[7.25, 71.2833, 7.925],
            "Cabin" => &[None, Some("C85"), Some("")],
            "Embarked" => &[Some("S"), Some("C"), None]
        )
        .unwrap();

        let records = records_from_dataframe(&df).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].passenger_id, Some(1));
        assert_eq!(records[0].sex, Some(Sex::Male));
        assert_eq!(records[1].cabin.as_deref(), Some("C85"));
        assert_eq!(records[2].cabin, None);
        assert_eq!(records[2].age, None);
        assert_eq!(records[2].embarked, None);
        assert_eq!(records[1].survived, Some(true));
    }

    #[test]
    fn test_non_integral_counts_rejected() {
        let frame = |sibsp: f64, pclass: f64| {
            df!(
                "PassengerId" => &[1i64, 2],
                "Pclass" => &[3.0, pclass],
                "Name" => &["A, Mr. B", "C, Mrs. D"],
                "Sex" => &["male", "female"],
                "SibSp" => &[0.0, sibsp]
            )
            .unwrap()
        };

        assert!(records_from_dataframe(&frame(1.0, 2.0)).is_ok());

        let err = records_from_dataframe(&frame(-1.0, 2.0)).unwrap_err();
        assert!(
            matches!(err, SurvivalError::Schema { passenger_id: Some(2), ref field, .. } if field == columns::SIBSP),
            "{:?}",
            err
        );

        let err = records_from_dataframe(&frame(0.5, 2.0)).unwrap_err();
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::SIBSP));

        let err = records_from_dataframe(&frame(0.0, 1.5)).unwrap_err();
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::PCLASS));

        let err = records_from_dataframe(&frame(0.0, 300.0)).unwrap_err();
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::PCLASS));
    }

    #[test]
    fn test_fractional_identifier_rejected() {
        let df = df!(
            "PassengerId" => &[1.5],
            "Pclass" => &[3i64],
            "Name" => &["A, Mr. B"],
            "Sex" => &["male"]
        )
        .unwrap();
        let err = records_from_dataframe(&df).unwrap_err();
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::PASSENGER_ID));
    }

    #[test]
    fn test_missing_required_column() {
        let df = df!(
            "PassengerId" => &[1i64],
            "Pclass" => &[3i64]
        )
        .unwrap();
        let err = records_from_dataframe(&df).unwrap_err();
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::SEX));
    }
}
