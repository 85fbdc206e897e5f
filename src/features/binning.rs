//! Fare and age discretization with edges fitted on training data

use crate::error::{Result, SurvivalError};
use serde::{Deserialize, Serialize};

/// Find the bin of `value` given ascending `edges`.
///
/// Bins are inclusive on the left and exclusive on the right, except the last
/// bin which also includes its upper edge. Values outside the outer edges
/// clamp into the first or last bin.
pub fn find_bin(value: f64, edges: &[f64]) -> usize {
    let n_bins = edges.len().saturating_sub(1).max(1);
    edges
        .iter()
        .skip(1)
        .take(n_bins - 1)
        .position(|&upper| value < upper)
        .unwrap_or(n_bins - 1)
}

/// Quantile at `q` using linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quantile bins over the training fare distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBins {
    edges: Vec<f64>,
}

impl FareBins {
    /// Compute `n_bins` quantile edges; duplicate edges are dropped
    pub fn fit(fares: &[f64], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(SurvivalError::InvalidParameter {
                name: "n_fare_bins".to_string(),
                value: n_bins.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let mut sorted: Vec<f64> = fares.iter().copied().filter(|f| f.is_finite()).collect();
        if sorted.is_empty() {
            return Err(SurvivalError::Transform("cannot fit fare bins without fares".to_string()));
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut edges: Vec<f64> = (0..=n_bins)
            .map(|i| quantile(&sorted, i as f64 / n_bins as f64))
            .collect();
        edges.dedup();
        if edges.len() < 2 {
            let only = edges[0];
            edges.push(only);
        }

        Ok(Self { edges })
    }

    /// Build bins from known edges
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        validate_edges("fare", &edges)?;
        Ok(Self { edges })
    }

    /// Bin index of a fare
    pub fn bin(&self, fare: f64) -> usize {
        find_bin(fare, &self.edges)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }
}

/// Labeled age buckets with outer edges fitted on training ages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBins {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl AgeBins {
    /// Combine the configured interior cut points with the training range
    pub fn fit(ages: &[f64], cuts: &[f64], labels: &[String]) -> Result<Self> {
        if labels.len() != cuts.len() + 1 {
            return Err(SurvivalError::Config(format!(
                "{} age labels given for {} bins",
                labels.len(),
                cuts.len() + 1
            )));
        }
        let (min_age, max_age) = ages
            .iter()
            .copied()
            .filter(|a| a.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, a| match acc {
                None => Some((a, a)),
                Some((lo, hi)) => Some((lo.min(a), hi.max(a))),
            })
            .ok_or_else(|| SurvivalError::Transform("cannot fit age bins without ages".to_string()))?;

        let mut edges = Vec::with_capacity(cuts.len() + 2);
        edges.push(min_age.min(0.0));
        edges.extend_from_slice(cuts);
        edges.push(max_age.max(cuts.last().copied().unwrap_or(0.0)));
        validate_edges("age", &edges)?;

        Ok(Self {
            edges,
            labels: labels.to_vec(),
        })
    }

    /// Bin index of an age
    pub fn bin(&self, age: f64) -> usize {
        find_bin(age, &self.edges)
    }

    /// Label of a bin index
    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or("unknown")
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }
}

fn validate_edges(kind: &str, edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(SurvivalError::Transform(format!("{} bins need at least two edges", kind)));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] > w[1]) {
        return Err(SurvivalError::Transform(format!(
            "{} bin edges must be finite and ascending: {:?}",
            kind, edges
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_labels() -> Vec<String> {
        vec!["child".to_string(), "adult".to_string(), "senior".to_string()]
    }

    #[test]
    fn test_fare_bins_from_known_edges() {
        let bins = FareBins::from_edges(vec![0.0, 7.91, 14.45, 31.0, 512.33]).unwrap();
        assert_eq!(bins.bin(5.0), 0);
        assert_eq!(bins.bin(7.91), 1);
        assert_eq!(bins.bin(20.0), 2);
        assert_eq!(bins.bin(100.0), 3);
        assert_eq!(bins.bin(512.33), 3);
        assert_eq!(bins.bin(1000.0), 3);
    }

    #[test]
    fn test_fare_quartiles_interpolate() {
        let fares: Vec<f64> = (0..=8).map(|v| v as f64).collect();
        let bins = FareBins::fit(&fares, 4).unwrap();
        assert_eq!(bins.edges(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_fare_below_fitted_range_goes_to_first_bin() {
        let fares: Vec<f64> = (0..=8).map(|v| 10.0 + v as f64).collect();
        let bins = FareBins::fit(&fares, 4).unwrap();
        assert_eq!(bins.edges()[0], 10.0);
        assert_eq!(bins.bin(2.0), 0);
        assert_eq!(bins.bin(0.0), 0);
        assert_eq!(bins.bin(10.0), 0);
        assert_eq!(bins.bin(99.0), 3);
    }

    #[test]
    fn test_duplicate_fare_edges_dropped() {
        let fares = vec![7.25, 7.25, 7.25, 7.25, 7.25, 30.0];
        let bins = FareBins::fit(&fares, 4).unwrap();
        assert!(bins.n_bins() < 4);
        assert!(bins.edges().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_constant_fares_single_bin() {
        let bins = FareBins::fit(&[10.0, 10.0], 4).unwrap();
        assert_eq!(bins.n_bins(), 1);
        assert_eq!(bins.bin(10.0), 0);
    }

    #[test]
    fn test_age_bins_boundaries() {
        let ages = vec![0.42, 22.0, 35.0, 80.0];
        let bins = AgeBins::fit(&ages, &[16.0, 60.0], &default_labels()).unwrap();
        assert_eq!(bins.edges(), &[0.0, 16.0, 60.0, 80.0]);

        assert_eq!(bins.label(bins.bin(0.0)), "child");
        assert_eq!(bins.label(bins.bin(15.0)), "child");
        assert_eq!(bins.label(bins.bin(15.99)), "child");
        assert_eq!(bins.label(bins.bin(16.0)), "adult");
        assert_eq!(bins.label(bins.bin(59.0)), "adult");
        assert_eq!(bins.label(bins.bin(60.0)), "senior");
        // Final bin is inclusive on both ends; beyond it clamps
        assert_eq!(bins.label(bins.bin(80.0)), "senior");
        assert_eq!(bins.label(bins.bin(95.0)), "senior");
    }

    #[test]
    fn test_age_label_count_mismatch() {
        let err = AgeBins::fit(&[10.0], &[16.0, 60.0], &["a".to_string()]).unwrap_err();
        assert!(matches!(err, SurvivalError::Config(_)));
    }
}
