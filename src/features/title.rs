//! Name-title extraction and the fitted title vocabulary

use serde::{Deserialize, Serialize};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

/// Canonical title categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TitleCategory {
    Mr,
    Miss,
    Mrs,
    Master,
    /// Military, clerical and medical titles
    Officer,
    /// Nobility and honorifics
    Noble,
    Other,
}

impl TitleCategory {
    /// Ordinal encoding used in the model matrix
    pub fn code(self) -> f64 {
        match self {
            TitleCategory::Mr => 0.0,
            TitleCategory::Miss => 1.0,
            TitleCategory::Mrs => 2.0,
            TitleCategory::Master => 3.0,
            TitleCategory::Officer => 4.0,
            TitleCategory::Noble => 5.0,
            TitleCategory::Other => 6.0,
        }
    }

    /// Map a raw title (without the trailing period) to its category
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Mr" => TitleCategory::Mr,
            "Mrs" | "Mme" => TitleCategory::Mrs,
            "Miss" | "Mlle" | "Ms" => TitleCategory::Miss,
            "Master" => TitleCategory::Master,
            "Capt" | "Col" | "Major" | "Dr" | "Rev" => TitleCategory::Officer,
            "Don" | "Dona" | "Sir" | "Lady" | "Countess" | "Jonkheer" => TitleCategory::Noble,
            _ => TitleCategory::Other,
        }
    }
}

impl fmt::Display for TitleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TitleCategory::Mr => "Mr",
            TitleCategory::Miss => "Miss",
            TitleCategory::Mrs => "Mrs",
            TitleCategory::Master => "Master",
            TitleCategory::Officer => "Officer",
            TitleCategory::Noble => "Noble",
            TitleCategory::Other => "other",
        };
        f.write_str(s)
    }
}

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r" ([A-Za-z]+)\.").expect("title pattern is valid"))
}

/// Extract the raw title from a manifest name such as `"Braund, Mr. Owen Harris"`
pub fn extract_title(name: &str) -> Option<&str> {
    title_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Canonical category of a name, before vocabulary filtering
pub fn canonical_title(name: &str) -> TitleCategory {
    extract_title(name).map_or(TitleCategory::Other, TitleCategory::from_raw)
}

/// Title categories frequent enough in training to keep their own bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleVocabulary {
    categories: BTreeSet<TitleCategory>,
    counts: BTreeMap<TitleCategory, usize>,
    min_frequency: usize,
}

impl TitleVocabulary {
    /// Count canonical titles over training names and keep those at or above
    /// `min_frequency`.
    pub fn fit<'a, I>(names: I, min_frequency: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<TitleCategory, usize> = BTreeMap::new();
        for name in names {
            *counts.entry(canonical_title(name)).or_insert(0) += 1;
        }

        let categories = counts
            .iter()
            .filter(|(category, &count)| **category != TitleCategory::Other && count >= min_frequency)
            .map(|(category, _)| *category)
            .collect();

        Self {
            categories,
            counts,
            min_frequency,
        }
    }

    /// Category for a name under this vocabulary
    pub fn categorize(&self, name: &str) -> TitleCategory {
        let category = canonical_title(name);
        if self.categories.contains(&category) {
            category
        } else {
            TitleCategory::Other
        }
    }

    /// Whether a category kept its own bucket
    pub fn contains(&self, category: TitleCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Categories kept in the vocabulary, in canonical order
    pub fn categories(&self) -> impl Iterator<Item = TitleCategory> + '_ {
        self.categories.iter().copied()
    }

    /// Training count of a category
    pub fn count(&self, category: TitleCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn min_frequency(&self) -> usize {
        self.min_frequency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("Braund, Mr. Owen Harris"), Some("Mr"));
        assert_eq!(extract_title("Rothes, the Countess. of (Lucy Noel Martha Dyer-Edwards)"), Some("Countess"));
        assert_eq!(extract_title("Nameless"), None);
    }

    #[test]
    fn test_variants_collapse_to_canonical_set() {
        assert_eq!(canonical_title("Sagesser, Mlle. Emma"), TitleCategory::Miss);
        assert_eq!(canonical_title("Aubart, Mme. Leontine Pauline"), TitleCategory::Mrs);
        assert_eq!(canonical_title("Crosby, Capt. Edward Gifford"), TitleCategory::Officer);
        assert_eq!(canonical_title("Reuchlin, Jonkheer. John George"), TitleCategory::Noble);
        assert_eq!(canonical_title("Someone, Prof. Plum"), TitleCategory::Other);
    }

    #[test]
    fn test_low_frequency_title_collapses_to_other() {
        let mut names = vec!["Minahan, Dr. William Edward"];
        names.extend(std::iter::repeat("Smith, Mr. John").take(12));
        let vocab = TitleVocabulary::fit(names, 10);

        assert_eq!(vocab.categorize("Minahan, Dr. William Edward"), TitleCategory::Other);
        assert_eq!(vocab.categorize("Jones, Mr. Bob"), TitleCategory::Mr);
        assert_eq!(vocab.count(TitleCategory::Officer), 1);
        assert!(!vocab.contains(TitleCategory::Officer));
    }

    #[test]
    fn test_title_at_threshold_is_kept() {
        let mut names: Vec<&str> = std::iter::repeat("Minahan, Dr. William Edward").take(10).collect();
        names.extend(std::iter::repeat("Sagesser, Mlle. Emma").take(9));
        let vocab = TitleVocabulary::fit(names, 10);

        assert_eq!(vocab.count(TitleCategory::Officer), 10);
        assert!(vocab.contains(TitleCategory::Officer));
        assert_eq!(vocab.categorize("Minahan, Dr. William Edward"), TitleCategory::Officer);

        assert_eq!(vocab.count(TitleCategory::Miss), 9);
        assert!(!vocab.contains(TitleCategory::Miss));
        assert_eq!(vocab.categorize("Sagesser, Mlle. Emma"), TitleCategory::Other);
    }

    #[test]
    fn test_unseen_title_maps_to_other() {
        let vocab = TitleVocabulary::fit(vec!["A, Mr. B", "C, Mr. D"], 1);
        assert_eq!(vocab.categorize("E, Mrs. F"), TitleCategory::Other);
    }
}
