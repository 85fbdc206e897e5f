//! Reproducible train/evaluation partitioning

use crate::error::{Result, SurvivalError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Disjoint, sorted index lists covering every input record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

impl Partition {
    /// Pick the items at `indices`, cloned, in index order
    pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().filter_map(|&i| items.get(i).cloned()).collect()
    }

    pub fn train_items<T: Clone>(&self, items: &[T]) -> Vec<T> {
        Self::select(items, &self.train)
    }

    pub fn eval_items<T: Clone>(&self, items: &[T]) -> Vec<T> {
        Self::select(items, &self.eval)
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.eval.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits records into training and evaluation partitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSplitter {
    eval_fraction: f64,
    random_state: u64,
    stratify: bool,
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl DatasetSplitter {
    pub fn new(eval_fraction: f64) -> Self {
        Self {
            eval_fraction,
            random_state: 42,
            stratify: false,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Preserve the label ratio in both partitions
    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    pub fn eval_fraction(&self) -> f64 {
        self.eval_fraction
    }

    /// Evaluation size for a group of `n` records, rounded down
    fn eval_count(&self, n: usize) -> usize {
        (n as f64 * self.eval_fraction + 1e-9).floor() as usize
    }

    /// Partition `n` records. `labels` is required when stratifying.
    pub fn split(&self, n: usize, labels: Option<&[bool]>) -> Result<Partition> {
        if !(self.eval_fraction > 0.0 && self.eval_fraction < 1.0) {
            return Err(SurvivalError::InvalidParameter {
                name: "eval_fraction".to_string(),
                value: self.eval_fraction.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut train = Vec::with_capacity(n);
        let mut eval = Vec::new();

        let groups: Vec<Vec<usize>> = match (self.stratify, labels) {
            (true, Some(labels)) => {
                if labels.len() != n {
                    return Err(SurvivalError::ShapeError {
                        expected: format!("{} labels", n),
                        actual: format!("{} labels", labels.len()),
                    });
                }
                let (positive, negative): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| labels[i]);
                vec![negative, positive]
            }
            (true, None) => {
                return Err(SurvivalError::Data("stratified split requires labels".to_string()));
            }
            (false, _) => vec![(0..n).collect()],
        };

        // Each group rounds down on its own; remainders stay in training
        for mut group in groups {
            group.shuffle(&mut rng);
            let n_eval = self.eval_count(group.len());
            eval.extend_from_slice(&group[..n_eval]);
            train.extend_from_slice(&group[n_eval..]);
        }

        if train.is_empty() || eval.is_empty() {
            return Err(SurvivalError::Data(format!(
                "splitting {} records at fraction {} leaves an empty partition",
                n, self.eval_fraction
            )));
        }

        train.sort_unstable();
        eval.sort_unstable();
        debug!(
            n_train = train.len(),
            n_eval = eval.len(),
            stratify = self.stratify,
            "dataset split"
        );

        Ok(Partition { train, eval })
    }
}
