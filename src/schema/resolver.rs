//! Missing-value resolution fitted on the training partition

use super::{columns, PassengerRecord, Port, ResolvedRecord};
use crate::error::{Result, SurvivalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Imputation values learned once from training records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverParams {
    /// Median age over training records with a known age
    pub median_age: f64,
    /// Median fare per passenger class
    pub class_median_fare: BTreeMap<u8, f64>,
    /// Median fare over all training records, used when a class has no fares
    pub overall_median_fare: f64,
    /// Most frequent embarkation port
    pub most_frequent_port: Port,
}

/// Fills absent age, fare and port values; turns cabin into a presence flag
#[derive(Debug, Clone, Default)]
pub struct MissingValueResolver;

impl MissingValueResolver {
    pub fn new() -> Self {
        Self
    }

    /// Learn imputation values from training records
    pub fn fit(&self, records: &[PassengerRecord]) -> Result<ResolverParams> {
        if records.is_empty() {
            return Err(SurvivalError::Transform("cannot fit resolver on an empty training set".to_string()));
        }
        for record in records {
            record.validate()?;
        }

        let ages: Vec<f64> = records.iter().filter_map(|r| r.known_age()).collect();
        let median_age = median(ages).ok_or_else(|| {
            SurvivalError::Transform(format!("no known `{}` values in training records", columns::AGE))
        })?;

        let fares: Vec<f64> = records.iter().filter_map(|r| r.known_fare()).collect();
        let overall_median_fare = median(fares).ok_or_else(|| {
            SurvivalError::Transform(format!("no known `{}` values in training records", columns::FARE))
        })?;

        let mut fares_by_class: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
        for record in records {
            if let (Some(class), Some(fare)) = (record.pclass, record.known_fare()) {
                fares_by_class.entry(class).or_default().push(fare);
            }
        }
        let class_median_fare = fares_by_class
            .into_iter()
            .filter_map(|(class, fares)| median(fares).map(|m| (class, m)))
            .collect();

        let mut port_counts: BTreeMap<Port, usize> = BTreeMap::new();
        for port in records.iter().filter_map(|r| r.embarked) {
            *port_counts.entry(port).or_insert(0) += 1;
        }
        // Ties resolve to the earliest port in canonical order
        let most_frequent_port = Port::ALL
            .iter()
            .copied()
            .fold((Port::S, 0usize), |best, port| {
                let count = port_counts.get(&port).copied().unwrap_or(0);
                if count > best.1 {
                    (port, count)
                } else {
                    best
                }
            })
            .0;

        let params = ResolverParams {
            median_age,
            class_median_fare,
            overall_median_fare,
            most_frequent_port,
        };
        debug!(
            median_age = params.median_age,
            overall_median_fare = params.overall_median_fare,
            port = %params.most_frequent_port,
            "Fitted missing-value resolver"
        );
        Ok(params)
    }

    /// Resolve a single record against fitted parameters
    pub fn resolve(&self, record: &PassengerRecord, params: &ResolverParams) -> Result<ResolvedRecord> {
        let passenger_id = record.validate()?;
        // validate() guarantees these are present
        let pclass = record.pclass.unwrap_or(3);
        let sex = record
            .sex
            .ok_or_else(|| SurvivalError::schema(Some(passenger_id), columns::SEX, "missing sex"))?;

        let fare = match record.known_fare() {
            Some(f) => f,
            None => params
                .class_median_fare
                .get(&pclass)
                .copied()
                .unwrap_or(params.overall_median_fare),
        };

        Ok(ResolvedRecord {
            passenger_id,
            pclass,
            name: record.name.clone(),
            sex,
            age: record.known_age().unwrap_or(params.median_age),
            sibsp: record.sibsp,
            parch: record.parch,
            fare,
            has_cabin: record.cabin.as_deref().map_or(false, |c| !c.trim().is_empty()),
            embarked: record.embarked.unwrap_or(params.most_frequent_port),
            survived: record.survived,
        })
    }

    /// Resolve a batch of records, stopping at the first schema error
    pub fn resolve_all(&self, records: &[PassengerRecord], params: &ResolverParams) -> Result<Vec<ResolvedRecord>> {
        records.iter().map(|r| self.resolve(r, params)).collect()
    }
}

/// Median with midpoint interpolation for even-length inputs
pub(crate) fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Sex;

    fn training() -> Vec<PassengerRecord> {
        vec![
            PassengerRecord::new(1, 1, "A, Mr. A", Sex::Male).with_age(40.0).with_fare(80.0).with_embarked(Port::C),
            PassengerRecord::new(2, 1, "B, Mrs. B", Sex::Female).with_age(30.0).with_fare(60.0).with_embarked(Port::S),
            PassengerRecord::new(3, 3, "C, Mr. C", Sex::Male).with_age(20.0).with_fare(8.0).with_embarked(Port::S),
            PassengerRecord::new(4, 3, "D, Miss. D", Sex::Female).with_fare(7.0),
            PassengerRecord::new(5, 2, "E, Mr. E", Sex::Male).with_age(50.0).with_embarked(Port::Q),
        ]
    }

    #[test]
    fn test_fit_learns_medians_and_mode() {
        let params = MissingValueResolver::new().fit(&training()).unwrap();
        assert_eq!(params.median_age, 35.0);
        assert_eq!(params.class_median_fare.get(&1), Some(&70.0));
        assert_eq!(params.class_median_fare.get(&3), Some(&7.5));
        assert_eq!(params.class_median_fare.get(&2), None);
        assert_eq!(params.overall_median_fare, 34.0);
        assert_eq!(params.most_frequent_port, Port::S);
    }

    #[test]
    fn test_resolve_fills_missing_fields() {
        let resolver = MissingValueResolver::new();
        let params = resolver.fit(&training()).unwrap();

        let raw = PassengerRecord::new(9, 3, "Z, Mr. Z", Sex::Male).with_cabin("B22");
        let resolved = resolver.resolve(&raw, &params).unwrap();
        assert_eq!(resolved.age, 35.0);
        assert_eq!(resolved.fare, 7.5);
        assert_eq!(resolved.embarked, Port::S);
        assert!(resolved.has_cabin);

        // Class without training fares falls back to the overall median
        let raw = PassengerRecord::new(10, 2, "Y, Mr. Y", Sex::Male);
        let resolved = resolver.resolve(&raw, &params).unwrap();
        assert_eq!(resolved.fare, 34.0);
        assert!(!resolved.has_cabin);
    }

    #[test]
    fn test_resolve_is_not_refit() {
        let resolver = MissingValueResolver::new();
        let params = resolver.fit(&training()).unwrap();
        let old = PassengerRecord::new(11, 1, "X, Mr. X", Sex::Male).with_age(90.0);
        let young = PassengerRecord::new(12, 1, "W, Mr. W", Sex::Male);
        resolver.resolve(&old, &params).unwrap();
        assert_eq!(resolver.resolve(&young, &params).unwrap().age, 35.0);
    }

    #[test]
    fn test_resolve_missing_identifier_is_fatal() {
        let resolver = MissingValueResolver::new();
        let params = resolver.fit(&training()).unwrap();
        let mut raw = PassengerRecord::new(1, 1, "A, Mr. A", Sex::Male);
        raw.passenger_id = None;
        let err = resolver.resolve(&raw, &params).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, SurvivalError::Schema { ref field, .. } if field == columns::PASSENGER_ID));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(Vec::new()), None);
    }
}
